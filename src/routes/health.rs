use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/liveness", get(liveness))
}

/// Answers once the database can serve a trivial query. No auth.
async fn liveness(State(state): State<AppState>) -> AppResult<&'static str> {
    let conn = state.db.get()?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok("OK")
}
