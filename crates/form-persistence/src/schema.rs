//! Esquema Diesel. Debe coincidir con `migrations/*_init/up.sql`.

diesel::table! {
    forms (id) {
        id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        fields -> Jsonb,
        owner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    workflows (id) {
        id -> Uuid,
        name -> Text,
        description -> Nullable<Text>,
        owner_id -> Uuid,
        schema_id -> Nullable<Uuid>,
        status -> Text,
        workflow_trigger -> Jsonb,
        actions -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    submissions (id) {
        id -> Uuid,
        workflow_id -> Uuid,
        schema_id -> Nullable<Uuid>,
        data -> Jsonb,
        metadata -> Jsonb,
        status -> Text,
        schema_fingerprint -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(submissions -> workflows (workflow_id));

diesel::allow_tables_to_appear_in_same_query!(forms, workflows, submissions,);
