use std::path::Path;
use anyhow::{anyhow, Context};
use rocket::response::Redirect;
use rocket::response::status::Custom;
use rocket::{Build, Rocket, State};
use rocket_dyn_templates::{context, Template};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use crate::AppConfig;
use crate::db::DbPool;
use crate::timetable::validate_tag_style;
use crate::util::{anyhow_to_custom_error, not_found, sqlx_to_custom_error};

pub type EventId = i64;
pub type PersonId = i64;

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub id: EventId,
    pub slug: String,
    pub name: String,
}

pub async fn load_event(event_slug: &str, db: &State<DbPool>) -> Result<EventRecord, Custom<String>> {
    find_event(event_slug, &db.0).await
        .map_err(sqlx_to_custom_error)?
        .ok_or_else(|| not_found(format!("Event {event_slug}")))
}
pub async fn find_event(event_slug: &str, pool: &SqlitePool) -> Result<Option<EventRecord>, sqlx::Error> {
    sqlx::query_as("SELECT id, slug, name FROM core_event WHERE slug=?")
        .bind(event_slug)
        .fetch_optional(pool)
        .await
}

#[derive(Deserialize, Debug)]
struct Fixture {
    #[serde(default)]
    events: Vec<EventFixture>,
    #[serde(default)]
    time_slots: Vec<String>,
    #[serde(default)]
    tags: Vec<TagFixture>,
}
#[derive(Deserialize, Debug)]
struct EventFixture {
    slug: String,
    name: String,
    #[serde(default)]
    categories: Vec<CategoryFixture>,
}
#[derive(Deserialize, Debug)]
struct CategoryFixture {
    slug: String,
    title: String,
}
#[derive(Deserialize, Debug)]
struct TagFixture {
    title: String,
    #[serde(default)]
    order: i64,
    style: Option<String>,
}

/// Loads events, programme categories, time slots and timetable tags from a YAML file.
///
/// Existing rows are matched by slug (tags by title) and updated, so loading
/// the same fixture twice is harmless.
pub async fn load_fixture(path: impl AsRef<Path>, pool: &SqlitePool) -> anyhow::Result<()> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read fixture {}", path.display()))?;
    let fixture: Fixture = serde_yaml::from_str(&content)?;

    let mut txn = pool.begin().await?;
    for event in &fixture.events {
        let event_id: (EventId,) = sqlx::query_as("INSERT INTO core_event (slug, name) VALUES (?, ?) \
                ON CONFLICT (slug) DO UPDATE SET name=excluded.name RETURNING id")
            .bind(&event.slug)
            .bind(&event.name)
            .fetch_one(&mut *txn).await?;
        for category in &event.categories {
            sqlx::query("INSERT INTO programme_category (event_id, slug, title) VALUES (?, ?, ?) \
                    ON CONFLICT (event_id, slug) DO UPDATE SET title=excluded.title")
                .bind(event_id.0)
                .bind(&category.slug)
                .bind(&category.title)
                .execute(&mut *txn).await?;
        }
    }
    for name in &fixture.time_slots {
        sqlx::query("INSERT INTO ropecon2019_timeslot (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *txn).await?;
    }
    for tag in &fixture.tags {
        let style = match &tag.style {
            Some(style) => validate_tag_style(style).map_err(|e| anyhow!("Tag {}: {e}", tag.title))?,
            None => crate::timetable::DEFAULT_TAG_STYLE,
        };
        let updated = sqlx::query("UPDATE timetable_tag SET \"order\"=?, style=? WHERE title=?")
            .bind(tag.order)
            .bind(style)
            .bind(&tag.title)
            .execute(&mut *txn).await?;
        if updated.rows_affected() == 0 {
            sqlx::query("INSERT INTO timetable_tag (title, \"order\", style) VALUES (?, ?, ?)")
                .bind(&tag.title)
                .bind(tag.order)
                .bind(style)
                .execute(&mut *txn).await?;
        }
    }
    txn.commit().await?;
    info!("Fixture {} loaded, events: {}, time slots: {}, tags: {}",
        path.display(), fixture.events.len(), fixture.time_slots.len(), fixture.tags.len());
    Ok(())
}

#[get("/event/create-demo")]
async fn get_event_create_demo(cfg: &State<AppConfig>, db: &State<DbPool>) -> Result<Redirect, Custom<String>> {
    load_fixture(&cfg.demo_fixture, &db.0).await.map_err(anyhow_to_custom_error)?;
    Ok(Redirect::to("/"))
}

#[get("/event/<event_slug>")]
async fn get_event(event_slug: &str, db: &State<DbPool>) -> Result<Template, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    Ok(Template::render("event", context! {
        event,
    }))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
            get_event_create_demo,
            get_event,
        ])
}

#[cfg(test)]
mod test {
    use crate::db::test::memory_pool;
    use super::{find_event, load_fixture};

    #[rocket::async_test]
    async fn test_load_fixture_twice() {
        let pool = memory_pool().await;
        load_fixture("fixtures/ropecon2019.yaml", &pool).await.unwrap();
        load_fixture("fixtures/ropecon2019.yaml", &pool).await.unwrap();

        let event = find_event("ropecon2019", &pool).await.unwrap().unwrap();
        assert_eq!(event.name, "Ropecon 2019");
        assert!(find_event("nope", &pool).await.unwrap().is_none());

        let (categories,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM programme_category WHERE event_id=?")
            .bind(event.id)
            .fetch_one(&pool).await.unwrap();
        assert_eq!(categories, 2);
        let (tags,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM timetable_tag")
            .fetch_one(&pool).await.unwrap();
        assert_eq!(tags, 3);
    }

    #[rocket::async_test]
    async fn test_load_missing_fixture() {
        let pool = memory_pool().await;
        assert!(load_fixture("fixtures/does-not-exist.yaml", &pool).await.is_err());
    }
}
