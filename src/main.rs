use migraine_diary::{app, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let state = AppState::init().await?;
    db::prepare(&state.db).await;

    app::serve(app::build_api_app(state), 8000).await
}
