use anyhow::Result;
use tracing::{debug, info};

use tally_data::{
    validate_category_name, Category, CategoryFilter, Delete, Insert, Query,
    RecordType, ValidationError, DEFAULT_ICON,
};

/// Built-in expense categories with their icons.
pub const DEFAULT_EXPENSE_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "ic_category_food"),
    ("Transport", "ic_category_transport"),
    ("Shopping", "ic_category_shopping"),
    ("Entertainment", "ic_category_entertainment"),
    ("Education", "ic_category_education"),
    ("Medical", "ic_category_medical"),
    ("Housing", "ic_category_housing"),
    ("Communication", "ic_category_communication"),
    ("Other", "ic_category_other"),
];

/// Built-in income categories with their icons.
pub const DEFAULT_INCOME_CATEGORIES: &[(&str, &str)] = &[
    ("Salary", "ic_category_salary"),
    ("Bonus", "ic_category_bonus"),
    ("Part-time", "ic_category_parttime"),
    ("Investment", "ic_category_investment"),
    ("Red packet", "ic_category_redpacket"),
    ("Other", "ic_category_other"),
];

/// The built-in categories for a user.
pub fn default_categories(user_id: &str) -> Vec<Category> {
    let expense = DEFAULT_EXPENSE_CATEGORIES
        .iter()
        .map(|entry| (entry, RecordType::Expense));
    let income = DEFAULT_INCOME_CATEGORIES
        .iter()
        .map(|entry| (entry, RecordType::Income));

    expense
        .chain(income)
        .map(|((name, icon), record_type)| Category {
            id: 0,
            user_id: user_id.to_string(),
            name: name.to_string(),
            record_type,
            icon: icon.to_string(),
            is_custom: false,
        })
        .collect()
}

/// Categories of a user, built-ins first.
pub async fn list_categories<DB>(
    db: &DB,
    user_id: &str,
    record_type: Option<RecordType>,
) -> Result<Vec<Category>>
where
    DB: Query<Category, Filter = CategoryFilter> + Send + Sync,
{
    db.query(&CategoryFilter {
        user_id: Some(user_id.to_string()),
        record_type,
        ..Default::default()
    })
    .await
}

/// Insert the built-in categories unless the user
/// already has some. Returns the number of inserted
/// categories.
pub async fn seed_default_categories<DB>(db: &DB, user_id: &str) -> Result<usize>
where
    DB: Query<Category, Filter = CategoryFilter> + Insert<Category> + Send + Sync,
{
    if !list_categories(db, user_id, None).await?.is_empty() {
        debug!(user_id, "categories present, not seeding");
        return Ok(0);
    }

    let categories = default_categories(user_id);
    let count = categories.len();
    for category in categories {
        db.insert(category).await?;
    }
    info!(user_id, count, "seeded default categories");
    Ok(count)
}

/// Add a user defined category. The name is trimmed and
/// must be unique among the user's categories of that type.
pub async fn add_custom_category<DB>(
    db: &DB,
    user_id: &str,
    name: &str,
    record_type: RecordType,
    icon: Option<&str>,
) -> Result<Category>
where
    DB: Query<Category, Filter = CategoryFilter> + Insert<Category> + Send + Sync,
{
    let name = validate_category_name(name)?;
    let existing = db
        .query(&CategoryFilter {
            user_id: Some(user_id.to_string()),
            name: Some(name.clone()),
            record_type: Some(record_type),
            ..Default::default()
        })
        .await?;
    if !existing.is_empty() {
        return Err(ValidationError::DuplicateCategory(name, record_type).into());
    }

    let category = db
        .insert(Category {
            id: 0,
            user_id: user_id.to_string(),
            name,
            record_type,
            icon: icon.unwrap_or(DEFAULT_ICON).to_string(),
            is_custom: true,
        })
        .await?;
    info!(user_id, name = %category.name, %record_type, "added category");
    Ok(category)
}

/// Delete a category of the user. Unknown ids, or ids
/// of someone else's category, are ignored.
pub async fn delete_category<DB>(db: &DB, user_id: &str, id: i64) -> Result<()>
where
    DB: Query<Category, Filter = CategoryFilter> + Delete<Category> + Send + Sync,
{
    let categories = db
        .query(&CategoryFilter {
            id: Some(id),
            user_id: Some(user_id.to_string()),
            ..Default::default()
        })
        .await?;
    if categories.is_empty() {
        debug!(id, "no such category");
    }
    for category in categories {
        db.delete(category).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tally_data::User;
    use tally_db::Connection;

    async fn open() -> Connection {
        let db = Connection::open_test().await;
        db.insert(User::new("alice", "pw", 0)).await.unwrap();
        db.insert(User::new("bob", "pw", 0)).await.unwrap();
        db
    }

    #[test]
    fn test_default_categories() {
        let categories = default_categories("alice");
        assert_eq!(categories.len(), 15);
        assert!(categories.iter().all(|c| !c.is_custom && c.user_id == "alice"));

        let expense = categories
            .iter()
            .filter(|c| c.record_type == RecordType::Expense)
            .count();
        assert_eq!(expense, 9);
        assert_eq!(categories[0].name, "Food");
        assert_eq!(categories[0].icon, "ic_category_food");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = open().await;
        assert_eq!(seed_default_categories(&db, "alice").await.unwrap(), 15);
        assert_eq!(seed_default_categories(&db, "alice").await.unwrap(), 0);

        let all = list_categories(&db, "alice", None).await.unwrap();
        assert_eq!(all.len(), 15);
        let income = list_categories(&db, "alice", Some(RecordType::Income))
            .await
            .unwrap();
        assert_eq!(income.len(), 6);
        assert!(list_categories(&db, "bob", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_custom_category() {
        let db = open().await;
        seed_default_categories(&db, "alice").await.unwrap();

        let pets = add_custom_category(&db, "alice", "  Pets ", RecordType::Expense, None)
            .await
            .unwrap();
        assert_eq!(pets.name, "Pets");
        assert_eq!(pets.icon, DEFAULT_ICON);
        assert!(pets.is_custom);

        // Custom categories are listed after the built-ins
        let all = list_categories(&db, "alice", Some(RecordType::Expense))
            .await
            .unwrap();
        assert_eq!(all.last().unwrap().name, "Pets");

        // Same name with another type or user is fine
        add_custom_category(&db, "alice", "Pets", RecordType::Income, Some("ic_paw"))
            .await
            .unwrap();
        add_custom_category(&db, "bob", "Pets", RecordType::Expense, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_custom_category_rejects() {
        let db = open().await;
        seed_default_categories(&db, "alice").await.unwrap();

        let err = add_custom_category(&db, "alice", "Food", RecordType::Expense, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::DuplicateCategory(
                "Food".to_string(),
                RecordType::Expense
            ))
        );

        let err = add_custom_category(&db, "alice", " ", RecordType::Expense, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyCategory)
        );
    }

    #[tokio::test]
    async fn test_delete_category() {
        let db = open().await;
        let pets = add_custom_category(&db, "alice", "Pets", RecordType::Expense, None)
            .await
            .unwrap();

        // Not bob's to delete
        delete_category(&db, "bob", pets.id).await.unwrap();
        assert_eq!(list_categories(&db, "alice", None).await.unwrap().len(), 1);

        delete_category(&db, "alice", pets.id).await.unwrap();
        assert!(list_categories(&db, "alice", None).await.unwrap().is_empty());

        // Again, nothing left to delete
        delete_category(&db, "alice", pets.id).await.unwrap();
    }
}
