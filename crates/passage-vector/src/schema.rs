use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow schema of the entries table. `seq` mirrors the assignment order of
/// ids and is the tie-breaker for equal distances. The vector width is fixed
/// per index when it is first created.
pub fn entries_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("seq", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("source_offset", DataType::Int64, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}

pub fn meta_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("key", DataType::Utf8, false),
        Field::new("value", DataType::Utf8, false),
        Field::new(
            "updated_at",
            DataType::Timestamp(arrow_schema::TimeUnit::Millisecond, None),
            false,
        ),
    ]))
}
