#[macro_use] extern crate rocket;

use rocket::fairing::AdHoc;
use rocket::fs::FileServer;
use rocket::response::status::Custom;
use rocket::State;
use rocket_dyn_templates::{Template, context, handlebars};
use rocket_dyn_templates::handlebars::{Handlebars, Helper};
use serde::Deserialize;
use crate::db::{DbPool, DbPoolFairing};
use crate::event::EventRecord;
use crate::util::sqlx_to_custom_error;

#[cfg(test)]
mod tests;
mod db;
mod event;
mod forms;
mod programme;
mod signup;
mod tables;
mod timetable;
mod util;

fn default_demo_fixture() -> String {
    "fixtures/ropecon2019.yaml".to_string()
}

#[derive(Deserialize, Debug)]
struct AppConfig {
    #[serde(default = "default_demo_fixture")]
    demo_fixture: String,
}

#[get("/")]
async fn index(db: &State<DbPool>) -> Result<Template, Custom<String>> {
    let events: Vec<EventRecord> = sqlx::query_as("SELECT id, slug, name FROM core_event ORDER BY slug")
        .fetch_all(&db.0)
        .await
        .map_err(sqlx_to_custom_error)?;
    Ok(Template::render("index", context! {
        events,
    }))
}

#[launch]
fn rocket() -> _ {
    let rocket = rocket::build()
        .attach(Template::custom(|engines| {
            let handlebars = &mut engines.handlebars;

            // id attribute of a form field input, the same scheme labels point to
            handlebars.register_helper("field_id",
                                       Box::new(|h: &Helper, _r: &Handlebars, _: &handlebars::Context, _rc: &mut handlebars::RenderContext, out: &mut dyn handlebars::Output| -> handlebars::HelperResult {
                                           let name = h.param(0).ok_or(handlebars::RenderErrorReason::ParamNotFoundForIndex("field_id", 0))?.value();
                                           out.write("id_")?;
                                           out.write(name.as_str().unwrap_or_default())?;
                                           if let Some(index) = h.param(1).and_then(|p| p.value().as_u64()) {
                                               out.write(&format!("_{index}"))?;
                                           }
                                           Ok(())
                                       }));
        }))
        .attach(AdHoc::config::<AppConfig>())
        .attach(DbPoolFairing())
        .mount("/", FileServer::from("./static"))
        .mount("/", routes![
            index,
        ]);
    let rocket = event::extend(rocket);
    let rocket = signup::extend(rocket);
    let rocket = programme::extend(rocket);
    timetable::extend(rocket)
}
