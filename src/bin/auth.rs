use migraine_diary::{app, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing();

    let state = AppState::init_with_mail().await?;
    db::prepare(&state.db).await;

    app::serve(app::build_auth_app(state), 8001).await
}
