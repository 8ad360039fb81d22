use super::*;
use chrono::offset::Utc;
use diesel::pg::Pg;
use crate::query::{LessonFilter, LessonOrder, Ordering, Page, PageRequest};
use crate::schema::{lesson_translations, lessons, translations};

fn check_name(name: &str) -> Result<()> {
    validate::required_text("name", name, validate::LESSON_NAME_MAX_LENGTH)
}

/// Replaces the lesson's translation set. The ids must already be resolved
/// through the ownership filter.
fn replace_translations(conn: &PgConnection, lesson_id: i32, translation_ids: &[i32]) -> Result<()> {
    diesel::delete(lesson_translations::table
            .filter(lesson_translations::lesson_id.eq(lesson_id)))
        .execute(conn)?;

    let rows: Vec<LessonTranslation> = translation_ids.iter()
        .map(|&translation_id| LessonTranslation { lesson_id, translation_id })
        .collect();

    if !rows.is_empty() {
        diesel::insert_into(lesson_translations::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

fn load_translations(conn: &PgConnection, lessons: &[Lesson])
    -> Result<Vec<Vec<TranslationWithLinks>>>
{
    if lessons.is_empty() {
        return Ok(vec![]);
    }

    let rows: Vec<(LessonTranslation, Translation)> = LessonTranslation::belonging_to(lessons)
        .inner_join(translations::table)
        .order((translations::priority.desc(), translations::id.asc()))
        .load(conn)?;

    let translations = translation::with_links(conn, rows.iter().map(|r| r.1.clone()).collect())?;
    let tagged: Vec<(LessonTranslation, TranslationWithLinks)> = rows.into_iter()
        .map(|r| r.0)
        .zip(translations)
        .collect();

    Ok(lessons.iter()
        .map(|lesson| {
            tagged.iter()
                .filter(|&&(ref lt, _)| lt.lesson_id == lesson.id)
                .map(|&(_, ref t)| t.clone())
                .collect()
        })
        .collect())
}

fn with_translations(conn: &PgConnection, lessons: Vec<Lesson>)
    -> Result<Vec<LessonWithTranslations>>
{
    let translations = load_translations(conn, &lessons)?;
    Ok(lessons.into_iter()
        .zip(translations)
        .map(|(lesson, translations)| LessonWithTranslations { lesson, translations })
        .collect())
}

fn get_owned(conn: &PgConnection, owner: &User, id: i32) -> Result<Lesson> {
    lessons::table
        .filter(lessons::id.eq(id))
        .filter(lessons::owner_id.eq(owner.id))
        .get_result(conn)
        .map_err(not_found("lesson"))
}

pub fn get(conn: &PgConnection, owner: &User, id: i32) -> Result<LessonWithTranslations> {
    let lesson = get_owned(conn, owner, id)?;
    let mut with = with_translations(conn, vec![lesson])?;
    with.pop().ok_or_else(|| ErrorKind::DatabaseOdd("lesson lost its translations").into())
}

/// All-or-nothing: a single foreign or unknown translation id rejects the
/// whole lesson.
pub fn create(conn: &PgConnection, owner: &User, input: &NewLessonInput)
    -> Result<LessonWithTranslations>
{
    check_name(&input.name)?;
    let priority = validate::priority("priority", input.priority)?;

    conn.transaction(|| {
        let translations = owner::owned_translations(conn, owner.id, "translations",
                                                     &input.translations)?;

        let lesson: Lesson = diesel::insert_into(lessons::table)
            .values(&NewLesson {
                name: input.name.trim(),
                priority,
                is_active: input.is_active,
                owner_id: owner.id,
            })
            .get_result(conn)?;

        let ids: Vec<i32> = translations.iter().map(|t| t.id).collect();
        replace_translations(conn, lesson.id, &ids)?;

        info!("Created lesson {} with {} translations for user {}.", lesson.id, ids.len(), owner.id);

        let mut with = with_translations(conn, vec![lesson])?;
        with.pop().ok_or_else(|| ErrorKind::DatabaseOdd("lesson lost its translations").into())
    })
}

/// Partial update. `translations` replaces the whole set when present; an
/// explicit `null` is rejected.
pub fn update(conn: &PgConnection, owner: &User, id: i32, patch: &LessonPatch)
    -> Result<LessonWithTranslations>
{
    if let Some(ref name) = patch.name {
        check_name(name)?;
    }
    let priority = match patch.priority {
        Some(p) => Some(validate::priority("priority", p)?),
        None => None,
    };
    if let Some(None) = patch.translations {
        return invalid("translations", "This field may not be null.");
    }

    conn.transaction(|| {
        let current = get_owned(conn, owner, id)?;

        if let Some(Some(ref ids)) = patch.translations {
            let translations = owner::owned_translations(conn, owner.id, "translations", ids)?;
            let ids: Vec<i32> = translations.iter().map(|t| t.id).collect();
            replace_translations(conn, current.id, &ids)?;
        }

        let lesson: Lesson = diesel::update(lessons::table.filter(lessons::id.eq(current.id)))
            .set(&LessonChanges {
                name: patch.name.as_ref().map(|n| n.trim().to_owned()),
                priority,
                is_active: patch.is_active,
                modified_at: Utc::now(),
            })
            .get_result(conn)?;

        if lesson.is_active != current.is_active {
            info!("Lesson {} is now {}.", lesson.id, if lesson.is_active { "active" } else { "inactive" });
        }

        let mut with = with_translations(conn, vec![lesson])?;
        with.pop().ok_or_else(|| ErrorKind::DatabaseOdd("lesson lost its translations").into())
    })
}

fn owned_query<'a>(owner_id: i32, filter: &LessonFilter) -> lessons::BoxedQuery<'a, Pg> {
    let mut query = lessons::table
        .filter(lessons::owner_id.eq(owner_id))
        .into_boxed();
    if let Some(is_active) = filter.is_active {
        query = query.filter(lessons::is_active.eq(is_active));
    }
    query
}

pub fn list_for_owner(conn: &PgConnection,
                      owner: &User,
                      filter: &LessonFilter,
                      ordering: &[Ordering<LessonOrder>],
                      page: PageRequest)
                      -> Result<Page<LessonWithTranslations>> {

    let count: i64 = owned_query(owner.id, filter).count().get_result(conn)?;
    page.check(count)?;

    let mut query = owned_query(owner.id, filter);
    for o in ordering {
        query = match (o.field, o.descending) {
            (LessonOrder::Name, false) => query.then_order_by(lessons::name.asc()),
            (LessonOrder::Name, true) => query.then_order_by(lessons::name.desc()),
            (LessonOrder::Priority, false) => query.then_order_by(lessons::priority.asc()),
            (LessonOrder::Priority, true) => query.then_order_by(lessons::priority.desc()),
        };
    }

    let items: Vec<Lesson> = query
        .then_order_by(lessons::id.asc())
        .limit(page.limit())
        .offset(page.offset())
        .load(conn)?;

    Ok(Page::new(page, count, with_translations(conn, items)?))
}

/// Relation rows, trainings and their stats go with the lesson (the foreign
/// keys cascade). The translations stay.
pub fn delete(conn: &PgConnection, owner: &User, id: i32) -> Result<()> {
    let deleted = diesel::delete(lessons::table
            .filter(lessons::id.eq(id))
            .filter(lessons::owner_id.eq(owner.id)))
        .execute(conn)?;

    if deleted == 0 {
        return Err(ErrorKind::NotFound("lesson").into());
    }
    info!("Deleted lesson {} of user {}.", id, owner.id);
    Ok(())
}
