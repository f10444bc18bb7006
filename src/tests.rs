use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use crate::db::DbPool;
use crate::forms::FieldErrors;
use crate::signup::CERTIFICATE_ADDRESS_REQUIRED;
use crate::tables::programme::ProgrammeRecord;
use crate::tables::signup_extra::{ShiftType, SignupExtraRecord, SpecialDiet};
use crate::timetable::TagRecord;

const EVENT_SLUG: &str = "ropecon2019";

fn create_test_server() -> Client {
    let client = Client::tracked(super::rocket()).unwrap();
    {
        let resp = client.get("/event/create-demo").dispatch();
        assert_eq!(resp.status(), Status::SeeOther);
    }
    client
}

#[test]
fn index_lists_events() {
    let client = create_test_server();
    let resp = client.get("/").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("Ropecon 2019"));

    let resp = client.get("/event/nope").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn signup_extra_certificate_address() {
    let client = create_test_server();

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/signup-extra/5"))
        .header(ContentType::Form)
        .body("shift_type=kaikkikay&want_certificate=on&certificate_delivery_address=%20%20")
        .dispatch();
    assert_eq!(resp.status(), Status::UnprocessableEntity);
    let errors = resp.into_json::<FieldErrors>().unwrap();
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["certificate_delivery_address"]);
    assert_eq!(errors.get("certificate_delivery_address"), &[CERTIFICATE_ADDRESS_REQUIRED.to_string()]);

    let resp = client.get(format!("/api/event/{EVENT_SLUG}/signup-extra/5")).dispatch();
    assert_eq!(resp.status(), Status::NotFound);

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/signup-extra/5"))
        .header(ContentType::Form)
        .body("shift_type=kaikkikay&want_certificate=on&certificate_delivery_address=123+Main+St\
            &special_diet=vegaaninen&special_diet=gluteeniton")
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let rec = resp.into_json::<SignupExtraRecord>().unwrap();
    assert_eq!(rec.certificate_delivery_address, "123 Main St");
    assert_eq!(rec.shift_type, Some(ShiftType::Either));

    let resp = client.get(format!("/api/event/{EVENT_SLUG}/signup-extra/5")).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let rec = resp.into_json::<SignupExtraRecord>().unwrap();
    assert_eq!(rec.special_diet, vec![SpecialDiet::GlutenFree, SpecialDiet::Vegan]);
}

#[test]
fn signup_extra_without_certificate() {
    let client = create_test_server();
    let resp = client.post(format!("/api/event/{EVENT_SLUG}/signup-extra/6"))
        .header(ContentType::Form)
        .body("shift_type=yksipitka&certificate_delivery_address=")
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let rec = resp.into_json::<SignupExtraRecord>().unwrap();
    assert!(!rec.want_certificate);
    assert_eq!(rec.certificate_delivery_address, "");

    // field level errors come before the certificate rule
    let resp = client.post(format!("/api/event/{EVENT_SLUG}/signup-extra/6"))
        .header(ContentType::Form)
        .body("shift_type=pitka&want_certificate=on")
        .dispatch();
    assert_eq!(resp.status(), Status::UnprocessableEntity);
    let errors = resp.into_json::<FieldErrors>().unwrap();
    assert!(errors.contains("shift_type"));
    assert!(!errors.contains("certificate_delivery_address"));
}

#[test]
fn signup_extra_html_form() {
    let client = create_test_server();
    let resp = client.get(format!("/event/{EVENT_SLUG}/signup-extra/7")).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("Työtodistus"));
    assert!(body.contains("Lisätiedot"));
    assert!(body.contains("Haluan todistuksen työskentelystäni"));
    assert!(body.contains("Lakto-ovo-vegaaninen"));

    let resp = client.post(format!("/event/{EVENT_SLUG}/signup-extra/7"))
        .header(ContentType::Form)
        .body("shift_type=montalyhytta&want_certificate=on")
        .dispatch();
    assert_eq!(resp.status(), Status::UnprocessableEntity);
    let body = resp.into_string().unwrap();
    assert!(body.contains(CERTIFICATE_ADDRESS_REQUIRED));

    let resp = client.post(format!("/event/{EVENT_SLUG}/signup-extra/7"))
        .header(ContentType::Form)
        .body("shift_type=montalyhytta&want_certificate=on&certificate_delivery_address=Kuja+1")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(resp.headers().get_one("Location"), Some("/event/ropecon2019/signup-extra/7"));
}

#[test]
fn programme_signup_extra() {
    let client = create_test_server();
    let resp = client.get(format!("/event/{EVENT_SLUG}/signup-extra/8/programme")).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("Erikoisruokavalio"));
    assert!(!body.contains("Työtodistus"));

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/signup-extra/8/programme"))
        .header(ContentType::Form)
        .body("special_diet=maidoton&special_diet_other=Ei+sipulia")
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let rec = resp.into_json::<SignupExtraRecord>().unwrap();
    assert_eq!(rec.special_diet, vec![SpecialDiet::MilkFree]);
    assert_eq!(rec.special_diet_other, "Ei sipulia");
    assert_eq!(rec.shift_type, None);
}

const RPG_FORM: &str = "title=Kadonneen+temppelin+arvoitus&rpg_system=D%26D+5e&approximate_length=180\
    &min_players=3&max_players=5&is_beginner_friendly=on&ropecon2018_genre_fantasy=on\
    &ropecon2018_style_light=on&description=Seikkailu&three_word_description=Perinteinen+luolaseikkailu\
    &ropecon2019_blocked_time_slots=1&ropecon2019_blocked_time_slots=3";

#[test]
fn rpg_submission() {
    let client = create_test_server();

    let resp = client.get(format!("/event/{EVENT_SLUG}/programme/rpg")).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("Game title"));
    assert!(body.contains("Who is the game meant for?"));
    assert!(body.contains("Perjantai-ilta"));

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/programme/rpg"))
        .header(ContentType::Form)
        .body("rpg_system=Generic&approximate_length=180&min_players=3&max_players=5")
        .dispatch();
    assert_eq!(resp.status(), Status::UnprocessableEntity);
    let errors = resp.into_json::<FieldErrors>().unwrap();
    assert!(errors.contains("title"));

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/programme/rpg?admin=true"))
        .header(ContentType::Form)
        .body(RPG_FORM)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let rec = resp.into_json::<ProgrammeRecord>().unwrap();
    assert_eq!(rec.values.title, "Kadonneen temppelin arvoitus");
    assert_eq!(rec.values.rpg_system, "D&D 5e");
    assert_eq!(rec.values.ropecon2019_blocked_time_slots, vec![1, 3]);
    assert!(rec.values.ropecon2018_genre_fantasy);

    let resp = client.get(format!("/api/event/{EVENT_SLUG}/programme/{}", rec.id)).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.into_json::<ProgrammeRecord>().unwrap(), rec);

    let resp = client.get(format!("/event/{EVENT_SLUG}/programme/{}", rec.id)).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("Kadonneen temppelin arvoitus"));
    assert!(body.contains("Lauantai-iltapäivä"));

    let resp = client.get(format!("/api/event/{EVENT_SLUG}/programme/rpg.csv")).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.content_type(), Some(ContentType::CSV));
    let csv = resp.into_string().unwrap();
    assert_eq!(csv.lines().count(), 2);

    let resp = client.post(format!("/event/{EVENT_SLUG}/programme/rpg"))
        .header(ContentType::Form)
        .body(RPG_FORM)
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
}

#[test]
fn rpg_title_length_in_characters() {
    let client = create_test_server();

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/programme/rpg"))
        .header(ContentType::Form)
        .body(format!("title={}&approximate_length=180&min_players=3&max_players=5", "%C3%A4".repeat(600)))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let rec = resp.into_json::<ProgrammeRecord>().unwrap();
    assert_eq!(rec.values.title, "ä".repeat(600));

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/programme/rpg"))
        .header(ContentType::Form)
        .body(format!("title={}&approximate_length=180&min_players=3&max_players=5", "a".repeat(1024)))
        .dispatch();
    assert_eq!(resp.status(), Status::UnprocessableEntity);
    let errors = resp.into_json::<FieldErrors>().unwrap();
    assert_eq!(errors.get("title"), &["Ensure this value has at most 1023 characters (it has 1024).".to_string()]);
}

#[test]
fn rpg_csv_unknown_event() {
    let client = create_test_server();
    let resp = client.get("/api/event/nope/programme/rpg.csv").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[rocket::async_test]
async fn rpg_csv_database_error() {
    use rocket::local::asynchronous::Client;

    let client = Client::tracked(super::rocket()).await.unwrap();
    let resp = client.get("/event/create-demo").dispatch().await;
    assert_eq!(resp.status(), Status::SeeOther);

    let db = client.rocket().state::<DbPool>().unwrap();
    sqlx::query("DROP TABLE programme_category").execute(&db.0).await.unwrap();

    let resp = client.get(format!("/api/event/{EVENT_SLUG}/programme/rpg.csv")).dispatch().await;
    assert_eq!(resp.status(), Status::InternalServerError);
}

#[rocket::async_test]
async fn rpg_submission_from_other_event() {
    use rocket::local::asynchronous::Client;

    let client = Client::tracked(super::rocket()).await.unwrap();
    let resp = client.get("/event/create-demo").dispatch().await;
    assert_eq!(resp.status(), Status::SeeOther);

    let db = client.rocket().state::<DbPool>().unwrap();
    sqlx::query("INSERT INTO core_event (slug, name) VALUES ('ropecon2018', 'Ropecon 2018')")
        .execute(&db.0).await.unwrap();

    // programmes always land in the ropecon2019 RPG category
    let resp = client.post("/event/ropecon2018/programme/rpg")
        .header(ContentType::Form)
        .body(RPG_FORM)
        .dispatch().await;
    assert_eq!(resp.status(), Status::SeeOther);
    let location = resp.headers().get_one("Location").unwrap().to_string();
    assert_eq!(location, format!("/event/{EVENT_SLUG}/programme/1"));

    let resp = client.get(location).dispatch().await;
    assert_eq!(resp.status(), Status::Ok);
}

#[rocket::async_test]
async fn rpg_submission_without_category() {
    use rocket::local::asynchronous::Client;

    let client = Client::tracked(super::rocket()).await.unwrap();
    let resp = client.get("/event/create-demo").dispatch().await;
    assert_eq!(resp.status(), Status::SeeOther);

    let db = client.rocket().state::<DbPool>().unwrap();
    sqlx::query("DELETE FROM programme_category WHERE slug='roolipeli'")
        .execute(&db.0).await.unwrap();

    let resp = client.post(format!("/api/event/{EVENT_SLUG}/programme/rpg"))
        .header(ContentType::Form)
        .body(RPG_FORM)
        .dispatch().await;
    assert_eq!(resp.status(), Status::InternalServerError);
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM programme_programme")
        .fetch_one(&db.0).await.unwrap();
    assert_eq!(count, 0);
}

#[test]
fn timetable_tags() {
    let client = create_test_server();
    let resp = client.get("/api/timetable/tags").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.content_type(), Some(ContentType::JSON));
    let tags = resp.into_json::<Vec<TagRecord>>().unwrap();
    assert_eq!(tags.iter().map(|t| (t.title.as_str(), t.style.as_str())).collect::<Vec<_>>(), vec![
        ("K-18", "label-danger"),
        ("In English", "label-info"),
        ("Aloittelijat", "label-default"),
    ]);
}
