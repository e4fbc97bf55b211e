use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![index_unique(bson::doc! { "email": 1 })],
    )
    .await?;

    // Organizations. The invite code is nullable, so the unique index is
    // sparse: uniqueness applies only to orgs that carry a code.
    create_indexes(
        db,
        "organizations",
        vec![index_unique_sparse(bson::doc! { "invite_code": 1 })],
    )
    .await?;

    // Memberships. The partial-unique index is the store-level backstop for
    // "at most one active membership per user".
    create_indexes(
        db,
        "memberships",
        vec![
            index_unique(bson::doc! { "org_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1 }),
            index_partial_unique(
                bson::doc! { "user_id": 1 },
                bson::doc! { "is_active": true },
            ),
        ],
    )
    .await?;

    // Presence statuses
    create_indexes(
        db,
        "presence_statuses",
        vec![index_unique(bson::doc! { "user_id": 1 })],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        "notifications",
        vec![
            index(bson::doc! { "recipient_id": 1, "status": 1, "expires_at": -1 }),
            index(bson::doc! { "recipient_id": 1, "created_at": -1 }),
            index(bson::doc! { "org_id": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn index_unique_sparse(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).sparse(true).build())
        .build()
}

fn index_partial_unique(keys: bson::Document, filter: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(filter)
                .build(),
        )
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
