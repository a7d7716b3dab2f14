table! {
    categories (id) {
        id -> Int4,
        title -> Varchar,
        description -> Text,
        slug -> Varchar,
        is_published -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    comments (id) {
        id -> Int4,
        text -> Text,
        post -> Int4,
        author -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    locations (id) {
        id -> Int4,
        name -> Varchar,
        is_published -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    posts (id) {
        id -> Int4,
        title -> Varchar,
        text -> Text,
        pub_date -> Timestamp,
        author -> Varchar,
        location -> Nullable<Int4>,
        category -> Nullable<Int4>,
        image -> Nullable<Varchar>,
        is_published -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    sessions (id) {
        id -> Varchar,
        user -> Varchar,
        expires -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Varchar,
        hash -> Varchar,
        salt -> Bytea,
        name -> Varchar,
        email -> Varchar,
        created_at -> Timestamp,
    }
}

joinable!(comments -> posts (post));
joinable!(comments -> users (author));
joinable!(posts -> categories (category));
joinable!(posts -> locations (location));
joinable!(posts -> users (author));
joinable!(sessions -> users (user));

allow_tables_to_appear_in_same_query!(categories, comments, locations, posts, sessions, users,);
