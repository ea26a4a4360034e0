use uuid::Uuid;

pub(crate) fn refresh(token_hash: &str) -> String {
    format!("refresh:{token_hash}")
}

pub(crate) fn lineage(lineage_id: Uuid) -> String {
    format!("lineage:{lineage_id}")
}

pub(crate) fn user_sessions(user_id: &str) -> String {
    format!("user:{user_id}")
}

pub(crate) fn rate(key: &str) -> String {
    format!("rate:{key}")
}
