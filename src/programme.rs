use anyhow::anyhow;
use itertools::Itertools;
use log::{debug, info};
use rocket::form::{Contextual, Form};
use rocket::http::{ContentType, Status};
use rocket::response::Redirect;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Either, Rocket, State};
use rocket_dyn_templates::{context, Template};
use sqlx::SqlitePool;
use crate::db::DbPool;
use crate::event::{load_event, EventRecord};
use crate::forms::{fields_for_model, BoundForm, Choice, FieldErrors, Fields, FormData, Layout, LayoutItem, ModelForm, Submission, Widget, NON_FIELD_ERRORS};
use crate::tables::programme::{insert_programme, list_programmes, list_time_slots, load_category, load_programme, CategoryRecord, ProgrammeId, ProgrammeRecord, ProgrammeValues, TimeSlotRecord, PROGRAMME_FIELDS};
use crate::util::{anyhow_to_custom_error, not_found, sqlx_to_custom_error, strip};

pub const RPG_EVENT_SLUG: &str = "ropecon2019";
pub const RPG_CATEGORY_SLUG: &str = "roolipeli";

/// Label and help text overrides of the RPG form, `None` help clears the model help text.
pub const FIELD_TEXTS: &[(&str, (&str, Option<&str>))] = &[
    ("title", ("Game title", None)),
    ("rpg_system", ("RPG system", Some("Which RPG system does the game use?"))),
    ("approximate_length", ("Game length (minutes)", None)),
    ("min_players", ("Minimum number of players", Some("Pelaajien vähimmäismäärä"))),
    ("max_players", ("Maximum number of players", None)),
    ("is_in_english", ("In English", Some("Please tick this box if the game is played in English."))),
    ("is_age_restricted", ("Ages 18+ only", Some("Please tick this box if your game contains themes which require it to be restricted to players who are 18+ years old. Please give more details in the game description."))),
    ("is_children_friendly", ("Suitable for children", Some("Please tick this box if your game is also suitable for children. If necessary, you can give more details in the game description."))),
    ("is_family_program", ("Family program", Some("Please tick this box if your game has been designed also for the youngest players, and the players’ guardians may help the players or participate in the game with them. If necessary, you can give more details in the game description."))),
    ("is_intended_for_experienced_participants", ("For experienced players", Some("Check this if the game requires knowledge of the world or the rules of the game."))),
    ("description", ("Description", Some("Advertise your game to potential players. Be extra sure to inform about potentially shocking or disturbing themes. Recommended length is 300–500 characters. We reserve the right to edit the text as necessary.<br><br>Please write the description at least in the language the game will be run in (English or Finnish). You may include the description in both languages, if you wish."))),
    ("three_word_description", ("Short blurb", Some("Summarize your game in one sentence which helps potential players get the gist of your game. For example, “Traditional D&D dungeon adventure” or “Lovecraftian horror in Equestria”. We reserve the right to edit the text."))),
    ("notes_from_host", ("Other information for the RPG coordinator", Some("If there is anything else you wish to say to the RPG coordinator that is not covered by the above questions, please enter it here."))),
];

const FIELD_REQUIRED: &str = "This field is required.";

/// Values of fields the RPG form does not edit, filled in when a programme is created.
#[derive(Debug)]
pub struct ExcludedFieldDefaults {
    pub category: CategoryRecord,
}

/// Forms that create programmes outside the regular programme offer flow.
#[rocket::async_trait]
pub trait AlternativeProgrammeForm: ModelForm {
    async fn excluded_field_defaults(&self, pool: &SqlitePool) -> anyhow::Result<ExcludedFieldDefaults>;
}

#[derive(Default)]
pub struct RpgFormBuilder {
    event: Option<EventRecord>,
    admin: bool,
    time_slots: Vec<TimeSlotRecord>,
}
impl RpgFormBuilder {
    pub fn event(mut self, event: EventRecord) -> Self {
        self.event = Some(event);
        self
    }
    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
    pub fn time_slots(mut self, time_slots: Vec<TimeSlotRecord>) -> Self {
        self.time_slots = time_slots;
        self
    }
    pub fn build(self) -> anyhow::Result<RpgForm> {
        let event = self.event.ok_or_else(|| anyhow!("RPG form cannot be constructed without an event"))?;
        let mut fields = fields_for_model(PROGRAMME_FIELDS, ProgrammeValues::FIELD_NAMES, &[
            ("ropecon2019_blocked_time_slots", Widget::CheckboxSelectMultiple),
        ])?;
        fields.field_mut("ropecon2019_blocked_time_slots")?.choices = self.time_slots.iter()
            .map(|slot| Choice { value: slot.id.to_string(), label: slot.name.clone() })
            .collect();
        apply_field_texts(&mut fields, FIELD_TEXTS)?;
        Ok(RpgForm { event, admin: self.admin, fields })
    }
}

/// Overwrites label and help text of each listed field.
fn apply_field_texts(fields: &mut Fields, texts: &[(&str, (&str, Option<&str>))]) -> anyhow::Result<()> {
    for &(name, (label, help_text)) in texts {
        let field = fields.field_mut(name)?;
        field.label = label.to_string();
        field.help_text = help_text.map(str::to_string);
    }
    Ok(())
}

pub struct RpgForm {
    event: EventRecord,
    admin: bool,
    fields: Fields,
}
impl RpgForm {
    pub fn builder() -> RpgFormBuilder {
        RpgFormBuilder::default()
    }
    pub fn event(&self) -> &EventRecord {
        &self.event
    }
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}
impl ModelForm for RpgForm {
    type Values = ProgrammeValues;

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn layout(&self) -> Layout {
        Layout(vec![
            LayoutItem::Field("title"),
            LayoutItem::Field("rpg_system"),
            LayoutItem::Field("approximate_length"),
            LayoutItem::Field("min_players"),
            LayoutItem::Field("max_players"),
            LayoutItem::Field("is_revolving_door"),
            LayoutItem::Fieldset("Who is the game meant for?".to_string(), vec![
                "is_in_english",
                "is_age_restricted",
                "is_children_friendly",
                "is_family_program",
                "is_beginner_friendly",
                "is_intended_for_experienced_participants",
            ]),
            LayoutItem::Fieldset("Game genre (Choose all which apply)".to_string(), vec![
                "ropecon2018_genre_fantasy",
                "ropecon2018_genre_scifi",
                "ropecon2018_genre_historical",
                "ropecon2018_genre_modern",
                "ropecon2018_genre_war",
                "ropecon2018_genre_horror",
                "ropecon2019_genre_adventure",
                "ropecon2018_genre_mystery",
                "ropecon2018_genre_drama",
                "ropecon2018_genre_humor",
            ]),
            LayoutItem::Fieldset("Game style (Choose any which apply)".to_string(), vec![
                "ropecon2018_style_serious",
                "ropecon2018_style_light",
                "ropecon2018_style_rules_heavy",
                "ropecon2018_style_rules_light",
                "ropecon2018_style_story_driven",
                "ropecon2018_style_character_driven",
                "ropecon2018_style_combat_driven",
                "description",
                "three_word_description",
                "ropecon2019_blocked_time_slots",
                "notes_from_host",
            ]),
        ])
    }

    fn clean(&self, values: &mut ProgrammeValues) -> Result<(), FieldErrors> {
        strip(&mut values.title);
        strip(&mut values.rpg_system);
        strip(&mut values.description);
        strip(&mut values.three_word_description);
        strip(&mut values.notes_from_host);

        let mut errors = FieldErrors::default();
        if values.title.is_empty() {
            errors.add("title", FIELD_REQUIRED);
        }
        self.fields.check_max_length("title", &values.title, &mut errors);
        self.fields.check_max_length("rpg_system", &values.rpg_system, &mut errors);
        self.fields.check_max_length("three_word_description", &values.three_word_description, &mut errors);
        let slot_choices = self.fields.get("ropecon2019_blocked_time_slots")
            .map(|f| f.choices.as_slice())
            .unwrap_or(&[]);
        for slot_id in &values.ropecon2019_blocked_time_slots {
            let slot_id = slot_id.to_string();
            if !slot_choices.iter().any(|c| c.value == slot_id) {
                errors.add("ropecon2019_blocked_time_slots", format!("Select a valid choice. {slot_id} is not one of the available choices."));
            }
        }
        values.ropecon2019_blocked_time_slots.sort();
        values.ropecon2019_blocked_time_slots.dedup();
        errors.into_result()
    }
}
#[rocket::async_trait]
impl AlternativeProgrammeForm for RpgForm {
    async fn excluded_field_defaults(&self, pool: &SqlitePool) -> anyhow::Result<ExcludedFieldDefaults> {
        let category = load_category(RPG_EVENT_SLUG, RPG_CATEGORY_SLUG, pool).await?;
        Ok(ExcludedFieldDefaults { category })
    }
}

/// Validates the submission and creates the programme in the default category.
///
/// The saved programme comes with its category, which may belong to another event than the form's.
pub async fn submit_rpg(form: &RpgForm, mut bound: BoundForm<ProgrammeValues>, pool: &SqlitePool) -> anyhow::Result<Submission<(CategoryRecord, ProgrammeRecord)>> {
    if !form.full_clean(&mut bound) {
        debug!("RPG submission rejected, event: {}, fields: {}", form.event().slug, bound.errors.fields().join(", "));
        return Ok(Submission::Invalid { data: bound.data, errors: bound.errors });
    }
    let Some(values) = bound.values else {
        return Ok(Submission::Invalid { data: bound.data, errors: bound.errors });
    };
    let defaults = form.excluded_field_defaults(pool).await?;
    let id = insert_programme(defaults.category.id, &values, pool).await?;
    info!("Programme created, id: {id}, category: {}, title: {}", defaults.category.slug, values.title);
    let rec = load_programme(defaults.category.event_id, id, pool).await?
        .ok_or_else(|| anyhow!("Programme {id} disappeared after insert"))?;
    Ok(Submission::Saved((defaults.category, rec)))
}

fn genres(values: &ProgrammeValues) -> Vec<&'static str> {
    [
        ("fantasy", values.ropecon2018_genre_fantasy),
        ("scifi", values.ropecon2018_genre_scifi),
        ("historical", values.ropecon2018_genre_historical),
        ("modern", values.ropecon2018_genre_modern),
        ("war", values.ropecon2018_genre_war),
        ("horror", values.ropecon2018_genre_horror),
        ("adventure", values.ropecon2019_genre_adventure),
        ("mystery", values.ropecon2018_genre_mystery),
        ("drama", values.ropecon2018_genre_drama),
        ("humor", values.ropecon2018_genre_humor),
    ].into_iter().filter(|(_, on)| *on).map(|(name, _)| name).collect()
}

fn styles(values: &ProgrammeValues) -> Vec<&'static str> {
    [
        ("serious", values.ropecon2018_style_serious),
        ("light", values.ropecon2018_style_light),
        ("rules_heavy", values.ropecon2018_style_rules_heavy),
        ("rules_light", values.ropecon2018_style_rules_light),
        ("story_driven", values.ropecon2018_style_story_driven),
        ("character_driven", values.ropecon2018_style_character_driven),
        ("combat_driven", values.ropecon2018_style_combat_driven),
    ].into_iter().filter(|(_, on)| *on).map(|(name, _)| name).collect()
}

pub fn programmes_to_csv(programmes: &[ProgrammeRecord], time_slots: &[TimeSlotRecord]) -> anyhow::Result<String> {
    let mut wr = csv::Writer::from_writer(vec![]);
    wr.write_record(["id", "title", "rpg_system", "approximate_length", "min_players", "max_players",
        "is_in_english", "is_age_restricted", "genres", "styles", "blocked_time_slots", "created"])?;
    for p in programmes {
        let blocked = p.values.ropecon2019_blocked_time_slots.iter()
            .filter_map(|id| time_slots.iter().find(|s| s.id == *id))
            .map(|s| s.name.as_str())
            .join(", ");
        wr.write_record([
            p.id.to_string(),
            p.values.title.clone(),
            p.values.rpg_system.clone(),
            p.values.approximate_length.to_string(),
            p.values.min_players.to_string(),
            p.values.max_players.to_string(),
            p.values.is_in_english.to_string(),
            p.values.is_age_restricted.to_string(),
            genres(&p.values).join(", "),
            styles(&p.values).join(", "),
            blocked,
            p.created.format("%Y-%m-%d %H:%M:%S").to_string(),
        ])?;
    }
    let data = wr.into_inner().map_err(|e| anyhow!("{e}"))?;
    Ok(String::from_utf8(data)?)
}

async fn load_rpg_form(event: EventRecord, admin: bool, pool: &SqlitePool) -> Result<RpgForm, Custom<String>> {
    let time_slots = list_time_slots(pool).await.map_err(sqlx_to_custom_error)?;
    RpgForm::builder()
        .event(event)
        .admin(admin)
        .time_slots(time_slots)
        .build()
        .map_err(anyhow_to_custom_error)
}

fn render_rpg_page(form: &RpgForm, data: &FormData, errors: &FieldErrors) -> Result<Template, Custom<String>> {
    let items = form.render(data, errors).map_err(anyhow_to_custom_error)?;
    Ok(Template::render("rpg-form", context! {
        event: form.event(),
        admin: form.is_admin(),
        items,
        non_field_errors: errors.get(NON_FIELD_ERRORS),
    }))
}

#[get("/event/<event_slug>/programme/rpg?<admin>")]
async fn get_rpg(event_slug: &str, admin: Option<bool>, db: &State<DbPool>) -> Result<Template, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = load_rpg_form(event, admin.unwrap_or(false), &db.0).await?;
    let data = FormData::from_serialize(&ProgrammeValues::default()).map_err(anyhow_to_custom_error)?;
    render_rpg_page(&form, &data, &FieldErrors::default())
}

#[post("/event/<event_slug>/programme/rpg?<admin>", data = "<values>")]
async fn post_rpg(
    event_slug: &str,
    admin: Option<bool>,
    values: Form<Contextual<'_, ProgrammeValues>>,
    db: &State<DbPool>,
) -> Result<Either<Redirect, Custom<Template>>, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = load_rpg_form(event, admin.unwrap_or(false), &db.0).await?;
    let bound = BoundForm::from_contextual(values.into_inner(), &form.fields().names());
    match submit_rpg(&form, bound, &db.0).await.map_err(anyhow_to_custom_error)? {
        Submission::Saved((category, rec)) => Ok(Either::Left(Redirect::to(format!("/event/{}/programme/{}", category.event_slug, rec.id)))),
        Submission::Invalid { data, errors } => {
            let page = render_rpg_page(&form, &data, &errors)?;
            Ok(Either::Right(Custom(Status::UnprocessableEntity, page)))
        }
    }
}

async fn find_programme(event_slug: &str, programme_id: ProgrammeId, db: &State<DbPool>) -> Result<(EventRecord, ProgrammeRecord), Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let programme = load_programme(event.id, programme_id, &db.0).await
        .map_err(sqlx_to_custom_error)?
        .ok_or_else(|| not_found(format!("Programme {programme_id}")))?;
    Ok((event, programme))
}

#[get("/event/<event_slug>/programme/<programme_id>", rank = 2)]
async fn get_programme(event_slug: &str, programme_id: ProgrammeId, db: &State<DbPool>) -> Result<Template, Custom<String>> {
    let (event, programme) = find_programme(event_slug, programme_id, db).await?;
    let time_slots = list_time_slots(&db.0).await.map_err(sqlx_to_custom_error)?;
    let blocked_time_slots = time_slots.into_iter()
        .filter(|s| programme.values.ropecon2019_blocked_time_slots.contains(&s.id))
        .collect::<Vec<_>>();
    Ok(Template::render("programme", context! {
        event,
        genres: genres(&programme.values),
        styles: styles(&programme.values),
        blocked_time_slots,
        programme,
    }))
}

#[post("/api/event/<event_slug>/programme/rpg?<admin>", data = "<values>")]
async fn api_post_rpg(
    event_slug: &str,
    admin: Option<bool>,
    values: Form<Contextual<'_, ProgrammeValues>>,
    db: &State<DbPool>,
) -> Result<Result<Json<ProgrammeRecord>, Custom<Json<FieldErrors>>>, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = load_rpg_form(event, admin.unwrap_or(false), &db.0).await?;
    let bound = BoundForm::from_contextual(values.into_inner(), &form.fields().names());
    match submit_rpg(&form, bound, &db.0).await.map_err(anyhow_to_custom_error)? {
        Submission::Saved((_, rec)) => Ok(Ok(Json(rec))),
        Submission::Invalid { errors, .. } => Ok(Err(Custom(Status::UnprocessableEntity, Json(errors)))),
    }
}

#[get("/api/event/<event_slug>/programme/<programme_id>", rank = 2)]
async fn api_get_programme(event_slug: &str, programme_id: ProgrammeId, db: &State<DbPool>) -> Result<Json<ProgrammeRecord>, Custom<String>> {
    let (_, programme) = find_programme(event_slug, programme_id, db).await?;
    Ok(Json(programme))
}

#[get("/api/event/<event_slug>/programme/rpg.csv")]
async fn api_get_rpg_csv(event_slug: &str, db: &State<DbPool>) -> Result<(ContentType, String), Custom<String>> {
    let category = load_category(event_slug, RPG_CATEGORY_SLUG, &db.0).await
        .map_err(|e| match e.downcast_ref::<sqlx::Error>() {
            Some(_) => anyhow_to_custom_error(e),
            None => Custom(Status::NotFound, e.to_string()),
        })?;
    let programmes = list_programmes(category.id, &db.0).await.map_err(sqlx_to_custom_error)?;
    let time_slots = list_time_slots(&db.0).await.map_err(sqlx_to_custom_error)?;
    let csv = programmes_to_csv(&programmes, &time_slots).map_err(anyhow_to_custom_error)?;
    Ok((ContentType::CSV, csv))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
        get_rpg,
        post_rpg,
        get_programme,
        api_post_rpg,
        api_get_programme,
        api_get_rpg_csv,
    ])
}

#[cfg(test)]
mod test {
    use crate::db::test::memory_pool;
    use crate::event::{find_event, load_fixture};
    use crate::forms::{FieldKind, ModelField, RenderedItem};
    use super::*;

    fn event() -> EventRecord {
        EventRecord { id: 1, slug: RPG_EVENT_SLUG.to_string(), name: "Ropecon 2019".to_string() }
    }

    fn slots() -> Vec<TimeSlotRecord> {
        vec![
            TimeSlotRecord { id: 1, name: "Perjantai-ilta".to_string() },
            TimeSlotRecord { id: 2, name: "Lauantaiaamu".to_string() },
        ]
    }

    fn bound(values: ProgrammeValues) -> BoundForm<ProgrammeValues> {
        BoundForm { values: Some(values), data: FormData::default(), errors: FieldErrors::default() }
    }

    #[test]
    fn test_build_requires_event() {
        let err = RpgForm::builder().admin(true).time_slots(slots()).build().err().unwrap();
        assert!(err.to_string().contains("without an event"));
        let form = RpgForm::builder().event(event()).build().unwrap();
        assert!(!form.is_admin());
        assert_eq!(form.event().slug, RPG_EVENT_SLUG);
    }

    #[test]
    fn test_field_texts_override() {
        let form = RpgForm::builder().event(event()).time_slots(slots()).build().unwrap();
        for &(name, (label, help_text)) in FIELD_TEXTS {
            let field = form.fields().get(name).unwrap();
            assert_eq!(field.label, label, "{name}");
            assert_eq!(field.help_text.as_deref(), help_text, "{name}");
        }
        assert_eq!(form.fields().get("title").unwrap().help_text, None);

        for model_field in PROGRAMME_FIELDS {
            if FIELD_TEXTS.iter().any(|(name, _)| *name == model_field.name) {
                continue;
            }
            let field = form.fields().get(model_field.name).unwrap();
            assert_eq!(field.label, model_field.verbose_name, "{}", model_field.name);
            assert_eq!(field.help_text.as_deref(), model_field.help_text, "{}", model_field.name);
        }
    }

    #[test]
    fn test_apply_field_texts() {
        const MODEL: &[ModelField] = &[
            ModelField::new("title", "Title", FieldKind::Char { max_length: 1023 }).help("Name of the game"),
            ModelField::new("rpg_system", "RPG system", FieldKind::Char { max_length: 512 }).help("Rules used"),
            ModelField::new("description", "Description", FieldKind::Text).help("Shown to players"),
        ];
        let mut fields = fields_for_model(MODEL, &["title", "rpg_system", "description"], &[]).unwrap();
        apply_field_texts(&mut fields, &[
            ("title", ("Game title", None)),
            ("rpg_system", ("System", Some("Which rules?"))),
        ]).unwrap();

        let title = fields.get("title").unwrap();
        assert_eq!(title.label, "Game title");
        assert_eq!(title.help_text, None);
        let system = fields.get("rpg_system").unwrap();
        assert_eq!(system.label, "System");
        assert_eq!(system.help_text.as_deref(), Some("Which rules?"));
        let description = fields.get("description").unwrap();
        assert_eq!(description.label, "Description");
        assert_eq!(description.help_text.as_deref(), Some("Shown to players"));

        assert!(apply_field_texts(&mut fields, &[("nope", ("Nope", None))]).is_err());
    }

    #[test]
    fn test_layout_covers_fields() {
        let form = RpgForm::builder().event(event()).time_slots(slots()).build().unwrap();
        assert_eq!(form.layout().field_names(), ProgrammeValues::FIELD_NAMES.to_vec());
        let blocked = form.fields().get("ropecon2019_blocked_time_slots").unwrap();
        assert_eq!(blocked.widget, Widget::CheckboxSelectMultiple);
        assert!(!blocked.required);
        assert_eq!(blocked.choices.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(), vec!["Perjantai-ilta", "Lauantaiaamu"]);

        let items = form.render(&FormData::default(), &FieldErrors::default()).unwrap();
        assert_eq!(items.len(), 9);
        let RenderedItem::Fieldset { legend, fields } = &items[8] else { panic!("fieldset expected") };
        assert_eq!(legend, "Game style (Choose any which apply)");
        assert_eq!(fields.len(), 11);
    }

    #[test]
    fn test_clean() {
        let form = RpgForm::builder().event(event()).time_slots(slots()).build().unwrap();
        let mut values = ProgrammeValues {
            title: "  ".to_string(),
            ropecon2019_blocked_time_slots: vec![2, 5, 2],
            ..Default::default()
        };
        let errors = form.clean(&mut values).unwrap_err();
        assert_eq!(errors.get("title"), &[FIELD_REQUIRED.to_string()]);
        assert_eq!(errors.get("ropecon2019_blocked_time_slots").len(), 1);

        let mut values = ProgrammeValues {
            title: " Kadonneen temppelin arvoitus ".to_string(),
            ropecon2019_blocked_time_slots: vec![2, 1, 2],
            ..Default::default()
        };
        assert!(form.clean(&mut values).is_ok());
        assert_eq!(values.title, "Kadonneen temppelin arvoitus");
        assert_eq!(values.ropecon2019_blocked_time_slots, vec![1, 2]);

        let mut values = ProgrammeValues { title: "ä".repeat(1023), rpg_system: "ö".repeat(513), ..Default::default() };
        let errors = form.clean(&mut values).unwrap_err();
        assert!(errors.get("title").is_empty());
        assert_eq!(errors.get("rpg_system"), &["Ensure this value has at most 512 characters (it has 513).".to_string()]);
    }

    #[rocket::async_test]
    async fn test_excluded_field_defaults() {
        let pool = memory_pool().await;
        let form = RpgForm::builder().event(event()).build().unwrap();
        assert!(form.excluded_field_defaults(&pool).await.is_err());

        load_fixture("fixtures/ropecon2019.yaml", &pool).await.unwrap();
        let defaults = form.excluded_field_defaults(&pool).await.unwrap();
        assert_eq!(defaults.category.slug, RPG_CATEGORY_SLUG);
    }

    #[rocket::async_test]
    async fn test_submit_rpg() {
        let pool = memory_pool().await;
        load_fixture("fixtures/ropecon2019.yaml", &pool).await.unwrap();
        let event = find_event(RPG_EVENT_SLUG, &pool).await.unwrap().unwrap();
        let time_slots = list_time_slots(&pool).await.unwrap();
        let slot_id = time_slots[1].id;
        let form = RpgForm::builder().event(event.clone()).time_slots(time_slots.clone()).build().unwrap();

        let values = ProgrammeValues {
            title: "Kadonneen temppelin arvoitus".to_string(),
            ropecon2018_genre_fantasy: true,
            ropecon2018_style_light: true,
            ropecon2019_blocked_time_slots: vec![slot_id],
            ..Default::default()
        };
        let Submission::Saved((category, rec)) = submit_rpg(&form, bound(values), &pool).await.unwrap() else { panic!("saved expected") };
        assert_eq!(category.event_slug, RPG_EVENT_SLUG);
        assert_eq!(rec.category_id, category.id);
        assert_eq!(rec.values.ropecon2019_blocked_time_slots, vec![slot_id]);

        let csv = programmes_to_csv(&list_programmes(category.id, &pool).await.unwrap(), &time_slots).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("id,title,rpg_system"));
        assert!(lines[1].contains("Kadonneen temppelin arvoitus"));
        assert!(lines[1].contains(",fantasy,light,"));
        assert!(lines[1].contains(&time_slots[1].name));

        let invalid = submit_rpg(&form, bound(ProgrammeValues::default()), &pool).await.unwrap();
        let Submission::Invalid { errors, .. } = invalid else { panic!("invalid expected") };
        assert!(errors.contains("title"));
    }
}
