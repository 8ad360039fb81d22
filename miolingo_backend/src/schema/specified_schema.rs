table! {
    lesson_translations (lesson_id, translation_id) {
        lesson_id -> Int4,
        translation_id -> Int4,
    }
}

table! {
    lessons (id) {
        id -> Int4,
        name -> Varchar,
        priority -> Int2,
        is_active -> Bool,
        created_at -> Timestamptz,
        modified_at -> Timestamptz,
        owner_id -> Int4,
    }
}

table! {
    stats (id) {
        id -> Int4,
        created_at -> Timestamptz,
        training_id -> Int4,
        translation_id -> Int4,
        succeed -> Bool,
    }
}

table! {
    trainings (id) {
        id -> Int4,
        lesson_id -> Int4,
        owner_id -> Int4,
        started_at -> Timestamptz,
        finished_at -> Nullable<Timestamptz>,
        score -> Nullable<Int2>,
    }
}

table! {
    translation_links (from_id, to_id) {
        from_id -> Int4,
        to_id -> Int4,
    }
}

table! {
    translations (id) {
        id -> Int4,
        lang -> Varchar,
        text -> Varchar,
        slug -> Varchar,
        priority -> Int2,
        created_at -> Timestamptz,
        modified_at -> Timestamptz,
        owner_id -> Int4,
    }
}

table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        email -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        source_lang -> Nullable<Varchar>,
        date_joined -> Timestamptz,
    }
}

joinable!(lesson_translations -> lessons (lesson_id));
joinable!(lesson_translations -> translations (translation_id));
joinable!(lessons -> users (owner_id));
joinable!(stats -> trainings (training_id));
joinable!(stats -> translations (translation_id));
joinable!(trainings -> lessons (lesson_id));
joinable!(trainings -> users (owner_id));
joinable!(translations -> users (owner_id));

allow_tables_to_appear_in_same_query!(
    lesson_translations,
    lessons,
    stats,
    trainings,
    translation_links,
    translations,
    users,
);
