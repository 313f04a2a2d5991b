/// Repair drift between user_roles (source of truth) and the denormalized
/// users.role column. Explicit operator action; the API exposes the same
/// operation as an admin route.
///
/// Usage: reconcile-roles [--dry-run]

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "reconcile-roles", about = "Reconcile denormalized user roles")]
struct Args {
    /// Report drift without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL environment variable not set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    if args.dry_run {
        let drifted: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users u
             JOIN user_roles r ON r.user_id = u.id
             WHERE u.role <> r.role",
        )
        .fetch_one(&pool)
        .await?;
        tracing::info!("{drifted} user(s) have a drifted denormalized role (dry run, no writes)");
        return Ok(());
    }

    let report = classline_api::services::roles::RoleService::reconcile(&pool).await?;
    tracing::info!(
        "Reconciliation complete: scanned {} role row(s), repaired {}",
        report.scanned,
        report.repaired
    );

    Ok(())
}
