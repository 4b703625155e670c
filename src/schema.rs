table! {
    allocations (id) {
        id -> Unsigned<Bigint>,
        appointment_id -> Unsigned<Bigint>,
        resource_id -> Unsigned<Bigint>,
        start_time -> Datetime,
        end_time -> Datetime,
    }
}

table! {
    appointments (id) {
        id -> Unsigned<Bigint>,
        username -> Char,
        service_id -> Unsigned<Bigint>,
        start_time -> Datetime,
        end_time -> Datetime,
        status -> Char,
        notes -> Nullable<Varchar>,
        cancellation_reason -> Nullable<Varchar>,
        cancelled_at -> Nullable<Datetime>,
        created_at -> Datetime,
    }
}

table! {
    categories (name) {
        name -> Char,
        information -> Varchar,
    }
}

table! {
    client_logins (token, username, login_time) {
        token -> Char,
        username -> Char,
        login_time -> Datetime,
    }
}

table! {
    clients (username) {
        username -> Char,
        password -> Char,
        name -> Char,
        telephone -> Char,
        is_active -> Bool,
    }
}

table! {
    notifications (id) {
        id -> Unsigned<Bigint>,
        recipient -> Char,
        kind -> Char,
        subject -> Varchar,
        message -> Varchar,
        appointment_id -> Nullable<Unsigned<Bigint>>,
        sent_at -> Datetime,
    }
}

table! {
    operator_logins (token, oid, login_time) {
        token -> Char,
        oid -> Char,
        login_time -> Datetime,
    }
}

table! {
    operators (oid) {
        oid -> Char,
        password -> Char,
    }
}

table! {
    resources (id) {
        id -> Unsigned<Bigint>,
        name -> Char,
        resource_type -> Char,
        status -> Char,
        is_active -> Bool,
        personnel_id -> Nullable<Char>,
        model -> Nullable<Char>,
        serial_number -> Nullable<Char>,
    }
}

table! {
    service_requirements (id) {
        id -> Unsigned<Bigint>,
        service_id -> Unsigned<Bigint>,
        resource_type -> Char,
        quantity -> Integer,
    }
}

table! {
    services (id) {
        id -> Unsigned<Bigint>,
        name -> Char,
        category -> Char,
        duration_minutes -> Integer,
        price_cents -> Integer,
        information -> Varchar,
        is_active -> Bool,
    }
}

allow_tables_to_appear_in_same_query!(
    allocations,
    appointments,
    categories,
    client_logins,
    clients,
    notifications,
    operator_logins,
    operators,
    resources,
    service_requirements,
    services,
);
