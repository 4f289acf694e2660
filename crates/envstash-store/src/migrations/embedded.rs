/// One schema change, identified by the file name it was loaded from
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_initial_schema",
    sql: include_str!("../../migrations/001_initial_schema.sql"),
}];

/// Every known migration, oldest first
pub fn get_migrations() -> &'static [Migration] {
    MIGRATIONS
}
