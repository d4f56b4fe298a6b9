use redb::TableDefinition;

/// Project records: "{tenant_id}/{slug}" -> ProjectRecord (msgpack)
pub const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");
