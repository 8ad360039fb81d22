//! Every reference coming from a client is resolved through here, scoped to
//! the acting user. A record owned by someone else is reported exactly like a
//! record that doesn't exist.

use super::*;
use std::collections::HashSet;

/// Deduplicates ids, keeping the first occurrence of each.
pub fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.iter().cloned().filter(|id| seen.insert(*id)).collect()
}

/// Resolves all `ids` to translations owned by `owner_id`, in the order given.
/// Fails on the first id that doesn't resolve.
pub fn owned_translations(conn: &PgConnection,
                          owner_id: i32,
                          field: &'static str,
                          ids: &[i32])
                          -> Result<Vec<Translation>> {
    use crate::schema::translations;

    let ids = dedup_ids(ids);
    if ids.is_empty() {
        return Ok(vec![]);
    }

    let found: Vec<Translation> = translations::table
        .filter(translations::owner_id.eq(owner_id))
        .filter(translations::id.eq_any(&ids))
        .get_results(conn)?;

    let mut ordered = Vec::with_capacity(ids.len());
    for id in ids {
        match found.iter().find(|t| t.id == id) {
            Some(t) => ordered.push(t.clone()),
            None => {
                warn!("User {} referenced translation {} which they don't own.", owner_id, id);
                return Err(ErrorKind::OwnershipViolation(field, id).into());
            }
        }
    }
    Ok(ordered)
}

pub fn owned_translation(conn: &PgConnection,
                         owner_id: i32,
                         field: &'static str,
                         id: i32)
                         -> Result<Translation> {
    let mut found = owned_translations(conn, owner_id, field, &[id])?;
    found.pop().ok_or_else(|| ErrorKind::OwnershipViolation(field, id).into())
}

pub fn owned_lesson(conn: &PgConnection, owner_id: i32, field: &'static str, id: i32)
    -> Result<Lesson>
{
    use crate::schema::lessons;

    let lesson: Option<Lesson> = lessons::table
        .filter(lessons::id.eq(id))
        .filter(lessons::owner_id.eq(owner_id))
        .get_result(conn)
        .optional()?;

    lesson.ok_or_else(|| {
        warn!("User {} referenced lesson {} which they don't own.", owner_id, id);
        ErrorKind::OwnershipViolation(field, id).into()
    })
}

pub fn owned_training(conn: &PgConnection, owner_id: i32, field: &'static str, id: i32)
    -> Result<Training>
{
    use crate::schema::trainings;

    let training: Option<Training> = trainings::table
        .filter(trainings::id.eq(id))
        .filter(trainings::owner_id.eq(owner_id))
        .get_result(conn)
        .optional()?;

    training.ok_or_else(|| {
        warn!("User {} referenced training {} which they don't own.", owner_id, id);
        ErrorKind::OwnershipViolation(field, id).into()
    })
}

#[cfg(test)]
mod tests {
    use super::dedup_ids;

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup_ids(&[]).is_empty());
    }
}
