use super::*;
use chrono::offset::Utc;
use diesel::pg::Pg;
use crate::query::{Ordering, Page, PageRequest, TranslationFilter, TranslationOrder};
use crate::schema::{translation_links, translations};

fn get_by_key(conn: &PgConnection, owner_id: i32, lang: &str, slug: &str)
    -> Result<Option<Translation>>
{
    let t = translations::table
        .filter(translations::owner_id.eq(owner_id))
        .filter(translations::lang.eq(lang))
        .filter(translations::slug.eq(slug))
        .get_result(conn)
        .optional()?;
    Ok(t)
}

/// Inserts unless the dedup key is taken. With `overwrite`, an existing row
/// gets the supplied text and priority. The unique constraint does the
/// arbitration, so concurrent callers end up with the same row.
fn upsert(conn: &PgConnection,
          owner_id: i32,
          lang: &str,
          text: &str,
          slug: &str,
          priority: i16,
          overwrite: bool)
          -> Result<(Translation, bool)> {

    conn.transaction(|| {
        let inserted: Option<Translation> = diesel::insert_into(translations::table)
            .values(&NewTranslation { lang, text, slug, priority, owner_id })
            .on_conflict((translations::lang, translations::slug, translations::owner_id))
            .do_nothing()
            .get_result(conn)
            .optional()?;

        if let Some(t) = inserted {
            info!("Created translation {} ({}) for user {}.", t.id, t.lang, owner_id);
            return Ok((t, true));
        }

        let key = translations::table
            .filter(translations::owner_id.eq(owner_id))
            .filter(translations::lang.eq(lang))
            .filter(translations::slug.eq(slug));

        let existing: Translation = if overwrite {
            diesel::update(key)
                .set((translations::text.eq(text),
                      translations::priority.eq(priority),
                      translations::modified_at.eq(Utc::now())))
                .get_result(conn)
        } else {
            key.get_result(conn)
        }.map_err(|e| match e {
            diesel::result::Error::NotFound => {
                Error::from(ErrorKind::DatabaseOdd("conflicting translation vanished"))
            }
            e => e.into(),
        })?;

        debug!("Translation {} already existed (overwritten: {}).", existing.id, overwrite);
        Ok((existing, false))
    })
}

/// Additive lookup: an existing translation is returned untouched.
pub fn find_or_create(conn: &PgConnection,
                      owner: &User,
                      lang: &str,
                      text: &str,
                      priority: i32)
                      -> Result<(Translation, bool)> {
    validate::lang("lang", lang)?;
    let text = text.trim();
    let slug = validate::translation_text("text", text)?;
    let priority = validate::priority("priority", priority)?;

    upsert(conn, owner.id, lang, text, &slug, priority, false)
}

/// Authoritative lookup: an existing translation gets the supplied text and
/// priority.
pub fn update_or_create(conn: &PgConnection,
                        owner: &User,
                        lang: &str,
                        text: &str,
                        priority: i32)
                        -> Result<(Translation, bool)> {
    validate::lang("lang", lang)?;
    let text = text.trim();
    let slug = validate::translation_text("text", text)?;
    let priority = validate::priority("priority", priority)?;

    upsert(conn, owner.id, lang, text, &slug, priority, true)
}

fn link_rows(a: i32, b: i32) -> [TranslationLink; 2] {
    [TranslationLink { from_id: a, to_id: b }, TranslationLink { from_id: b, to_id: a }]
}

/// Replaces all links of `translation` with `candidate_ids`. Links are
/// symmetric, so the other ends lose their link back as well.
pub fn set_links(conn: &PgConnection, translation: &Translation, candidate_ids: &[i32])
    -> Result<Vec<Translation>>
{
    if candidate_ids.contains(&translation.id) {
        return invalid("trans", "A translation can't be linked to itself.");
    }

    conn.transaction(|| {
        let targets = owner::owned_translations(conn, translation.owner_id, "trans", candidate_ids)?;

        diesel::delete(translation_links::table
                .filter(translation_links::from_id.eq(translation.id)
                    .or(translation_links::to_id.eq(translation.id))))
            .execute(conn)?;

        let rows: Vec<TranslationLink> = targets.iter()
            .flat_map(|t| link_rows(translation.id, t.id).to_vec())
            .collect();

        if !rows.is_empty() {
            diesel::insert_into(translation_links::table)
                .values(&rows)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }

        debug!("Translation {} is now linked to {:?}.",
               translation.id,
               targets.iter().map(|t| t.id).collect::<Vec<_>>());
        Ok(targets)
    })
}

/// Adds a single link, keeping the existing ones. Linking a translation to
/// itself is a no-op.
pub fn add_link(conn: &PgConnection, a: &Translation, b: &Translation) -> Result<()> {
    if a.owner_id != b.owner_id {
        return Err(ErrorKind::OwnershipViolation("trans", b.id).into());
    }
    if a.id == b.id {
        return Ok(());
    }
    diesel::insert_into(translation_links::table)
        .values(&link_rows(a.id, b.id)[..])
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(())
}

/// Loads the links of every translation in `items`, preserving their order.
pub fn with_links(conn: &PgConnection, items: Vec<Translation>)
    -> Result<Vec<TranslationWithLinks>>
{
    if items.is_empty() {
        return Ok(vec![]);
    }
    let ids: Vec<i32> = items.iter().map(|t| t.id).collect();

    let links: Vec<(i32, Translation)> = translation_links::table
        .inner_join(translations::table.on(translations::id.eq(translation_links::to_id)))
        .filter(translation_links::from_id.eq_any(&ids))
        .order((translations::lang.asc(), translations::slug.asc()))
        .select((translation_links::from_id, translations::all_columns))
        .load(conn)?;

    Ok(items.into_iter()
        .map(|translation| {
            let trans = links.iter()
                .filter(|&&(from_id, _)| from_id == translation.id)
                .map(|&(_, ref t)| t.clone())
                .collect();
            TranslationWithLinks { translation, trans }
        })
        .collect())
}

pub fn get(conn: &PgConnection, owner: &User, id: i32) -> Result<TranslationWithLinks> {
    let translation: Translation = translations::table
        .filter(translations::id.eq(id))
        .filter(translations::owner_id.eq(owner.id))
        .get_result(conn)
        .map_err(not_found("translation"))?;

    let mut with = with_links(conn, vec![translation])?;
    with.pop().ok_or_else(|| ErrorKind::DatabaseOdd("translation lost its links").into())
}

fn owned_query<'a>(owner_id: i32, filter: &TranslationFilter) -> translations::BoxedQuery<'a, Pg> {
    let mut query = translations::table
        .filter(translations::owner_id.eq(owner_id))
        .into_boxed();
    if let Some(ref lang) = filter.lang {
        query = query.filter(translations::lang.eq(lang.clone()));
    }
    query
}

pub fn list_for_owner(conn: &PgConnection,
                      owner: &User,
                      filter: &TranslationFilter,
                      ordering: &[Ordering<TranslationOrder>],
                      page: PageRequest)
                      -> Result<Page<TranslationWithLinks>> {

    let count: i64 = owned_query(owner.id, filter).count().get_result(conn)?;
    page.check(count)?;

    let mut query = owned_query(owner.id, filter);
    for o in ordering {
        query = match (o.field, o.descending) {
            (TranslationOrder::Text, false) => query.then_order_by(translations::text.asc()),
            (TranslationOrder::Text, true) => query.then_order_by(translations::text.desc()),
            (TranslationOrder::Priority, false) => query.then_order_by(translations::priority.asc()),
            (TranslationOrder::Priority, true) => query.then_order_by(translations::priority.desc()),
        };
    }

    let items: Vec<Translation> = query
        .then_order_by(translations::id.asc())
        .limit(page.limit())
        .offset(page.offset())
        .load(conn)?;

    Ok(Page::new(page, count, with_links(conn, items)?))
}

fn leaf_field(index: usize, field: &str) -> String {
    format!("trans[{}].{}", index, field)
}

/// Validates nested entries up front so that nothing gets written when one
/// of them is bad.
fn check_leaves(leaves: &[TranslationLeafInput]) -> Result<Vec<(String, String, i16)>> {
    leaves.iter()
        .enumerate()
        .map(|(i, leaf)| -> Result<(String, String, i16)> {
            validate::lang(&leaf_field(i, "lang"), &leaf.lang)?;
            let text = leaf.text.trim();
            let slug = validate::translation_text(&leaf_field(i, "text"), text)?;
            let priority = validate::priority(&leaf_field(i, "priority"), leaf.priority)?;
            Ok((text.to_owned(), slug, priority))
        })
        .collect()
}

fn unique_violation(e: diesel::result::Error) -> Error {
    if is_unique_violation(&e) {
        ErrorKind::UniqueConstraintViolation.into()
    } else {
        e.into()
    }
}

/// The explicit create path: an existing dedup key is an error here. Nested
/// `trans` entries are resolved additively.
pub fn create(conn: &PgConnection, owner: &User, input: &NewTranslationInput)
    -> Result<TranslationWithLinks>
{
    validate::lang("lang", &input.lang)?;
    let text = input.text.trim();
    let slug = validate::translation_text("text", text)?;
    let priority = validate::priority("priority", input.priority)?;
    let leaves = match input.trans {
        Some(ref leaves) => check_leaves(leaves)?,
        None => vec![],
    };

    conn.transaction(|| {
        if get_by_key(conn, owner.id, &input.lang, &slug)?.is_some() {
            return Err(ErrorKind::UniqueConstraintViolation.into());
        }

        let translation: Translation = diesel::insert_into(translations::table)
            .values(&NewTranslation {
                lang: &input.lang,
                text,
                slug: &slug,
                priority,
                owner_id: owner.id,
            })
            .get_result(conn)
            .map_err(unique_violation)?;

        info!("Created translation {} ({}) for user {}.", translation.id, translation.lang, owner.id);

        let mut ids = vec![];
        for (leaf, (text, slug, priority)) in input.trans.iter().flatten().zip(&leaves) {
            let (t, _) = upsert(conn, owner.id, &leaf.lang, text, slug, *priority, false)?;
            ids.push(t.id);
        }

        let trans = if ids.is_empty() {
            vec![]
        } else {
            set_links(conn, &translation, &ids)?
        };

        Ok(TranslationWithLinks { translation, trans })
    })
}

/// Partial update. When `trans` is present, it is the new, complete link
/// set: its entries overwrite existing translations with the same key.
pub fn update(conn: &PgConnection, owner: &User, id: i32, patch: &TranslationPatch)
    -> Result<TranslationWithLinks>
{
    if let Some(ref lang) = patch.lang {
        validate::lang("lang", lang)?;
    }
    let new_slug = match patch.text {
        Some(ref text) => Some(validate::translation_text("text", text.trim())?),
        None => None,
    };
    let priority = match patch.priority {
        Some(p) => Some(validate::priority("priority", p)?),
        None => None,
    };
    let leaves = match patch.trans {
        Some(ref leaves) => Some(check_leaves(leaves)?),
        None => None,
    };

    conn.transaction(|| {
        let current: Translation = translations::table
            .filter(translations::id.eq(id))
            .filter(translations::owner_id.eq(owner.id))
            .get_result(conn)
            .map_err(not_found("translation"))?;

        let lang = patch.lang.as_ref().unwrap_or(&current.lang);
        let slug = new_slug.as_ref().unwrap_or(&current.slug);
        if let Some(other) = get_by_key(conn, owner.id, lang, slug)? {
            if other.id != current.id {
                return Err(ErrorKind::UniqueConstraintViolation.into());
            }
        }

        let changes = TranslationChanges {
            lang: patch.lang.clone(),
            text: patch.text.as_ref().map(|t| t.trim().to_owned()),
            slug: new_slug.clone(),
            priority,
            modified_at: Utc::now(),
        };

        let translation: Translation = diesel::update(translations::table
                .filter(translations::id.eq(current.id)))
            .set(&changes)
            .get_result(conn)
            .map_err(unique_violation)?;

        if let (Some(inputs), Some(leaves)) = (patch.trans.as_ref(), leaves.as_ref()) {
            let mut ids = vec![];
            for (leaf, (text, slug, priority)) in inputs.iter().zip(leaves) {
                let (t, _) = upsert(conn, owner.id, &leaf.lang, text, slug, *priority, true)?;
                ids.push(t.id);
            }
            set_links(conn, &translation, &ids)?;
        }

        let mut with = with_links(conn, vec![translation])?;
        with.pop().ok_or_else(|| ErrorKind::DatabaseOdd("translation lost its links").into())
    })
}

pub fn delete(conn: &PgConnection, owner: &User, id: i32) -> Result<()> {
    let deleted = diesel::delete(translations::table
            .filter(translations::id.eq(id))
            .filter(translations::owner_id.eq(owner.id)))
        .execute(conn)?;

    if deleted == 0 {
        return Err(ErrorKind::NotFound("translation").into());
    }
    info!("Deleted translation {} of user {}.", id, owner.id);
    Ok(())
}
