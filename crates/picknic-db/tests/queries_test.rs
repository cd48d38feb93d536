//! Integration tests for the query modules: household scoping, pantry
//! upserts and partial updates, meal ordering, and shopping item updates.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use picknic_db::models::{MealType, ShoppingItemSource, ShoppingItemStatus};
use picknic_db::queries::{households, meal_plans, pantry, recipes, shopping_lists};
use picknic_test_utils::{create_test_db, drop_test_db};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn insert_recipe(pool: &PgPool, household_id: Uuid, title: &str, servings: i32) -> Uuid {
    let row: (Uuid,) = sqlx::query_as(
        "INSERT INTO recipes (household_id, title, servings, created_by) \
         VALUES ($1, $2, $3, 'test') RETURNING id",
    )
    .bind(household_id)
    .bind(title)
    .bind(servings)
    .fetch_one(pool)
    .await
    .unwrap();
    row.0
}

async fn insert_plan(pool: &PgPool, household_id: Uuid, week_start: NaiveDate) -> Uuid {
    let row: (Uuid,) = sqlx::query_as(
        "INSERT INTO meal_plans (household_id, week_start, created_by) \
         VALUES ($1, $2, 'test') RETURNING id",
    )
    .bind(household_id)
    .bind(week_start)
    .fetch_one(pool)
    .await
    .unwrap();
    row.0
}

async fn insert_entry(
    pool: &PgPool,
    meal_plan_id: Uuid,
    day: NaiveDate,
    meal_type: MealType,
    recipe_id: Uuid,
) {
    sqlx::query(
        "INSERT INTO meal_plan_entries (meal_plan_id, date, meal_type, recipe_id) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(meal_plan_id)
    .bind(day)
    .bind(meal_type)
    .bind(recipe_id)
    .execute(pool)
    .await
    .unwrap();
}

#[tokio::test]
async fn households_lookup_by_id_and_org() {
    let (pool, db_name) = create_test_db().await;

    let created = households::insert_household(&pool, "Smiths", Some("org_42"))
        .await
        .unwrap();
    households::insert_household(&pool, "Joneses", None).await.unwrap();

    let by_id = households::get_household(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(by_id.name, "Smiths");

    let by_org = households::get_household_by_org(&pool, "org_42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_org.id, created.id);
    assert!(households::get_household_by_org(&pool, "org_0").await.unwrap().is_none());
    assert_eq!(households::list_households(&pool).await.unwrap().len(), 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn pantry_upsert_replaces_quantity_for_same_name_and_unit() {
    let (pool, db_name) = create_test_db().await;
    let hid = households::insert_household(&pool, "Smiths", None).await.unwrap().id;

    let first = pantry::upsert_pantry_item(&pool, hid, "alice", "Rice", 500.0, "g", None)
        .await
        .unwrap();
    let second = pantry::upsert_pantry_item(
        &pool,
        hid,
        "bob",
        "Rice",
        200.0,
        "g",
        Some(date("2026-05-01")),
    )
    .await
    .unwrap();
    pantry::upsert_pantry_item(&pool, hid, "bob", "Rice", 1.0, "kg", None)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 200.0);
    assert_eq!(second.updated_by, "bob");
    assert_eq!(second.expires_at, Some(date("2026-05-01")));

    let items = pantry::list_pantry_items(&pool, hid).await.unwrap();
    let units: Vec<&str> = items.iter().map(|i| i.unit.as_str()).collect();
    assert_eq!(units, ["g", "kg"]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn pantry_partial_update_and_scoping() {
    let (pool, db_name) = create_test_db().await;
    let hid = households::insert_household(&pool, "Smiths", None).await.unwrap().id;
    let other = households::insert_household(&pool, "Joneses", None).await.unwrap().id;

    let item = pantry::upsert_pantry_item(
        &pool,
        hid,
        "alice",
        "Milk",
        1.0,
        "l",
        Some(date("2026-03-01")),
    )
    .await
    .unwrap();

    // Only quantity changes; expiry untouched.
    let updated = pantry::update_pantry_item(&pool, hid, item.id, "bob", Some(2.0), None, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.quantity, 2.0);
    assert_eq!(updated.unit, "l");
    assert_eq!(updated.expires_at, Some(date("2026-03-01")));
    assert_eq!(updated.updated_by, "bob");

    // Explicitly clearing the expiry.
    let cleared = pantry::update_pantry_item(&pool, hid, item.id, "bob", None, None, Some(None))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.expires_at, None);
    assert_eq!(cleared.quantity, 2.0);

    // Another household can neither see, edit nor delete it.
    assert!(pantry::get_pantry_item(&pool, other, item.id).await.unwrap().is_none());
    assert!(
        pantry::update_pantry_item(&pool, other, item.id, "eve", Some(9.0), None, None)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!pantry::delete_pantry_item(&pool, other, item.id).await.unwrap());

    assert!(pantry::delete_pantry_item(&pool, hid, item.id).await.unwrap());
    assert!(pantry::list_pantry_items(&pool, hid).await.unwrap().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn planned_meals_are_ordered_by_date_then_meal() {
    let (pool, db_name) = create_test_db().await;
    let hid = households::insert_household(&pool, "Smiths", None).await.unwrap().id;
    let soup = insert_recipe(&pool, hid, "Soup", 4).await;
    let toast = insert_recipe(&pool, hid, "Toast", 1).await;
    let plan = insert_plan(&pool, hid, date("2026-02-16")).await;

    insert_entry(&pool, plan, date("2026-02-17"), MealType::Breakfast, toast).await;
    insert_entry(&pool, plan, date("2026-02-16"), MealType::Dinner, soup).await;
    insert_entry(&pool, plan, date("2026-02-16"), MealType::Breakfast, toast).await;
    insert_entry(&pool, plan, date("2026-02-16"), MealType::Snack, toast).await;

    let meals = meal_plans::list_planned_meals(&pool, plan).await.unwrap();
    let order: Vec<(NaiveDate, MealType)> = meals.iter().map(|m| (m.date, m.meal_type)).collect();
    assert_eq!(
        order,
        [
            (date("2026-02-16"), MealType::Breakfast),
            (date("2026-02-16"), MealType::Dinner),
            (date("2026-02-16"), MealType::Snack),
            (date("2026-02-17"), MealType::Breakfast),
        ]
    );
    assert_eq!(meals[1].recipe_title, "Soup");
    assert_eq!(meals[1].recipe_servings, 4);

    let found = meal_plans::get_meal_plan_for_week(&pool, hid, date("2026-02-16"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, plan);
    assert!(
        meal_plans::get_meal_plan_for_week(&pool, hid, date("2026-02-23"))
            .await
            .unwrap()
            .is_none()
    );

    // Deleting a recipe removes the entries that scheduled it.
    assert!(recipes::delete_recipe(&pool, hid, toast).await.unwrap());
    assert_eq!(meal_plans::list_planned_meals(&pool, plan).await.unwrap().len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn owned_recipe_ids_filters_other_households() {
    let (pool, db_name) = create_test_db().await;
    let hid = households::insert_household(&pool, "Smiths", None).await.unwrap().id;
    let other = households::insert_household(&pool, "Joneses", None).await.unwrap().id;
    let mine = insert_recipe(&pool, hid, "Soup", 2).await;
    let theirs = insert_recipe(&pool, other, "Stew", 2).await;

    let owned = recipes::owned_recipe_ids(&pool, hid, &[mine, theirs, Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(owned, vec![mine]);
    assert!(recipes::get_recipe(&pool, hid, theirs).await.unwrap().is_none());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn shopping_items_sort_and_scope() {
    let (pool, db_name) = create_test_db().await;
    let hid = households::insert_household(&pool, "Smiths", None).await.unwrap().id;
    let other = households::insert_household(&pool, "Joneses", None).await.unwrap().id;
    let plan = insert_plan(&pool, hid, date("2026-02-16")).await;
    let list: (Uuid,) = sqlx::query_as(
        "INSERT INTO shopping_lists (household_id, meal_plan_id, name, created_by) \
         VALUES ($1, $2, 'Week of 2026-02-16', 'test') RETURNING id",
    )
    .bind(hid)
    .bind(plan)
    .fetch_one(&pool)
    .await
    .unwrap();
    let list_id = list.0;

    let eggs = shopping_lists::insert_item(&pool, list_id, "eggs", Some(6.0), None, ShoppingItemSource::Auto)
        .await
        .unwrap();
    shopping_lists::insert_item(&pool, list_id, "Bread", None, None, ShoppingItemSource::Manual)
        .await
        .unwrap();
    shopping_lists::insert_item(&pool, list_id, "Apples", Some(1.0), Some("kg"), ShoppingItemSource::Auto)
        .await
        .unwrap();
    assert_eq!(eggs.status, ShoppingItemStatus::Pending);

    let bought = shopping_lists::update_item_status(&pool, hid, eggs.id, ShoppingItemStatus::Bought)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bought.status, ShoppingItemStatus::Bought);

    assert!(
        shopping_lists::update_item_status(&pool, other, eggs.id, ShoppingItemStatus::Skipped)
            .await
            .unwrap()
            .is_none()
    );

    let names: Vec<String> = shopping_lists::list_items(&pool, list_id)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.ingredient_name)
        .collect();
    assert_eq!(names, ["Apples", "Bread", "eggs"]);

    let fetched = shopping_lists::get_shopping_list_for_meal_plan(&pool, plan)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.id, list_id);

    assert!(!shopping_lists::delete_item(&pool, other, eggs.id).await.unwrap());
    assert!(shopping_lists::delete_item(&pool, hid, eggs.id).await.unwrap());

    pool.close().await;
    drop_test_db(&db_name).await;
}
