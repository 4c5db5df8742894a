use sqlx::PgPool;

use crate::db::models::Student;

const COLUMNS: &str = "id, full_name, roll_no, class_name, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}
