use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classline_api::config::Config;
use classline_api::middleware::auth::JwtSecret;
use classline_api::{db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let state = AppState {
        db: pool,
        config: config.clone(),
    };

    // CORS: the configured app origin, plus localhost for development.
    let base_url = config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
            return true;
        }
        o == base_url
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        // Users
        .route("/users/{id}", get(routes::users::get_user).put(routes::users::update_user))
        .route("/users/{id}/tasks", get(routes::tasks::list_user_tasks))
        .route("/users/{id}/schedule", get(routes::schedules::list_user_schedule))
        .route("/users/{id}/moods", get(routes::moods::list_user_moods))
        // Parent/child links
        .route("/links", get(routes::links::list_links).post(routes::links::create_link))
        .route("/links/{id}/respond", post(routes::links::respond_link))
        .route("/links/{id}", delete(routes::links::delete_link))
        // Classes and enrollments
        .route("/classes", get(routes::classes::list_classes).post(routes::classes::create_class))
        .route("/classes/enroll", post(routes::classes::enroll_by_code))
        .route("/classes/{id}", get(routes::classes::get_class))
        .route("/classes/{id}/students", get(routes::classes::list_students))
        .route("/classes/{id}/tasks", get(routes::tasks::list_class_tasks))
        .route("/classes/{id}/enrollments", post(routes::classes::direct_enroll))
        .route(
            "/classes/{id}/enrollments/{student_id}",
            put(routes::classes::set_enrollment_status),
        )
        // Tasks
        .route("/tasks", get(routes::tasks::list_tasks).post(routes::tasks::create_task))
        .route(
            "/tasks/{id}",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        // Schedule
        .route(
            "/schedule",
            get(routes::schedules::list_schedule).post(routes::schedules::create_schedule_item),
        )
        .route(
            "/schedule/{id}",
            put(routes::schedules::update_schedule_item)
                .delete(routes::schedules::delete_schedule_item),
        )
        // Moods
        .route("/moods", get(routes::moods::list_moods).put(routes::moods::upsert_mood))
        .route("/moods/{id}", delete(routes::moods::delete_mood))
        // Messages
        .route("/messages", post(routes::messages::send_message))
        .route("/messages/conversations", get(routes::messages::get_conversations))
        .route("/messages/conversation/{user_id}", get(routes::messages::get_conversation))
        .route("/messages/{id}/read", post(routes::messages::mark_read))
        // Admin
        .route("/admin/users", get(routes::admin::list_users))
        .route("/admin/users/{id}/role", put(routes::admin::set_role))
        .route("/admin/roles/reconcile", post(routes::admin::reconcile_roles))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("classline API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
