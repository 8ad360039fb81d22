use super::*;
use chrono::{DateTime, offset::Utc};
use crate::schema::{stats, trainings};

/// Starts a session against one of the owner's lessons. Inactive lessons
/// can't be trained.
pub fn start(conn: &PgConnection, owner: &User, lesson_id: i32) -> Result<Training> {
    let lesson = owner::owned_lesson(conn, owner.id, "lesson", lesson_id)?;

    if !lesson.is_active {
        debug!("User {} tried to train inactive lesson {}.", owner.id, lesson.id);
        return Err(ErrorKind::InactiveLesson.into());
    }

    let training: Training = diesel::insert_into(trainings::table)
        .values(&NewTraining {
            lesson_id: lesson.id,
            owner_id: owner.id,
            started_at: Utc::now(),
        })
        .get_result(conn)?;

    info!("User {} started training {} on lesson {}.", owner.id, training.id, lesson.id);
    Ok(training)
}

/// Appends one answer. The score is left alone until `finish`.
pub fn record_stat(conn: &PgConnection, owner: &User, input: &NewStatInput) -> Result<Stat> {
    let training = owner::owned_training(conn, owner.id, "training", input.training)?;
    let translation = owner::owned_translation(conn, owner.id, "translation", input.translation)?;

    let stat: Stat = diesel::insert_into(stats::table)
        .values(&NewStat {
            training_id: training.id,
            translation_id: translation.id,
            succeed: input.succeed,
        })
        .get_result(conn)?;

    debug!("Recorded stat {} for training {} (succeed: {}).", stat.id, training.id, stat.succeed);
    Ok(stat)
}

fn count_successes(conn: &PgConnection, training_id: i32) -> Result<i16> {
    let count: i64 = stats::table
        .filter(stats::training_id.eq(training_id))
        .filter(stats::succeed.eq(true))
        .count()
        .get_result(conn)?;

    if count > i16::max_value() as i64 {
        return Err(ErrorKind::DatabaseOdd("score doesn't fit a smallint").into());
    }
    Ok(count as i16)
}

/// Sets `finished_at` and recomputes the score from the stats recorded so
/// far. Finishing again recomputes.
pub fn finish(conn: &PgConnection, owner: &User, training_id: i32, finished_at: DateTime<Utc>)
    -> Result<Training>
{
    conn.transaction(|| {
        let training = get_owned(conn, owner, training_id)?;

        if training.state() == TrainingState::Finished {
            debug!("Training {} is finished already; recomputing its score.", training.id);
        }

        let score = count_successes(conn, training.id)?;

        let training: Training = diesel::update(trainings::table.filter(trainings::id.eq(training.id)))
            .set((trainings::finished_at.eq(Some(finished_at)),
                  trainings::score.eq(Some(score))))
            .get_result(conn)?;

        info!("Training {} finished with score {}.", training.id, score);
        Ok(training)
    })
}

fn get_owned(conn: &PgConnection, owner: &User, id: i32) -> Result<Training> {
    trainings::table
        .filter(trainings::id.eq(id))
        .filter(trainings::owner_id.eq(owner.id))
        .get_result(conn)
        .map_err(not_found("training"))
}

pub fn get(conn: &PgConnection, owner: &User, id: i32) -> Result<TrainingWithLesson> {
    let training = get_owned(conn, owner, id)?;
    let lesson = lesson::get(conn, owner, training.lesson_id)?;
    Ok(TrainingWithLesson { training, lesson })
}

/// The answers recorded in a session, oldest first.
pub fn stats(conn: &PgConnection, owner: &User, training_id: i32) -> Result<Vec<Stat>> {
    let training = get_owned(conn, owner, training_id)?;

    let stats = Stat::belonging_to(&training)
        .order((stats::created_at.asc(), stats::id.asc()))
        .load(conn)?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_finished_at() {
        let mut training = Training {
            id: 1,
            lesson_id: 2,
            owner_id: 3,
            started_at: Utc::now(),
            finished_at: None,
            score: None,
        };
        assert_eq!(training.state(), TrainingState::Created);

        training.finished_at = Some(Utc::now());
        training.score = Some(4);
        assert_eq!(training.state(), TrainingState::Finished);
        assert_eq!(serde_json::to_value(training.state()).unwrap(), "finished");
    }
}
