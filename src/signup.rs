use conhttpd_proc_macros::FieldNames;
use itertools::Itertools;
use rocket::form::{Contextual, Form};
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Either, Rocket, State};
use rocket_dyn_templates::{context, Template};
use serde::Serialize;
use sqlx::SqlitePool;
use crate::db::DbPool;
use crate::event::{load_event, EventId, EventRecord, PersonId};
use crate::forms::{fields_for_model, BoundForm, FieldErrors, Fields, FormData, Layout, LayoutItem, ModelForm, Submission, Widget, NON_FIELD_ERRORS};
use crate::tables::signup_extra::{load_signup_extra, save_signup_extra, ShiftType, SignupExtraRecord, SpecialDiet, SIGNUP_EXTRA_FIELDS};
use crate::util::{anyhow_to_custom_error, not_found, sqlx_to_custom_error, strip};

pub const CERTIFICATE_ADDRESS_REQUIRED: &str = "Koska olet valinnut haluavasi työtodistuksen, on työtodistuksen toimitusosoite täytettävä.";

#[derive(Serialize, FromForm, FieldNames, Clone, Debug, PartialEq)]
pub struct SignupExtraValues {
    pub shift_type: ShiftType,
    pub want_certificate: bool,
    #[field(default = String::new())]
    pub certificate_delivery_address: String,
    #[field(default = Vec::new())]
    pub special_diet: Vec<SpecialDiet>,
    #[field(default = String::new())]
    pub special_diet_other: String,
    #[field(default = String::new())]
    pub prior_experience: String,
    #[field(default = String::new())]
    pub shift_wishes: String,
    #[field(default = String::new())]
    pub free_text: String,
}
impl SignupExtraValues {
    fn apply(self, rec: &mut SignupExtraRecord) {
        rec.shift_type = Some(self.shift_type);
        rec.want_certificate = self.want_certificate;
        rec.certificate_delivery_address = self.certificate_delivery_address;
        rec.special_diet = self.special_diet;
        rec.special_diet_other = self.special_diet_other;
        rec.prior_experience = self.prior_experience;
        rec.shift_wishes = self.shift_wishes;
        rec.free_text = self.free_text;
    }
}

pub struct SignupExtraForm {
    fields: Fields,
}
impl SignupExtraForm {
    pub fn new() -> anyhow::Result<Self> {
        let fields = fields_for_model(SIGNUP_EXTRA_FIELDS, SignupExtraValues::FIELD_NAMES, &[
            ("special_diet", Widget::CheckboxSelectMultiple),
        ])?;
        Ok(Self { fields })
    }
}
impl ModelForm for SignupExtraForm {
    type Values = SignupExtraValues;

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn layout(&self) -> Layout {
        Layout(vec![
            LayoutItem::Field("shift_type"),
            LayoutItem::Fieldset("Työtodistus".to_string(), vec![
                "want_certificate",
                "certificate_delivery_address",
            ]),
            LayoutItem::Fieldset("Lisätiedot".to_string(), vec![
                "special_diet",
                "special_diet_other",
                "prior_experience",
                "shift_wishes",
                "free_text",
            ]),
        ])
    }

    fn clean(&self, values: &mut SignupExtraValues) -> Result<(), FieldErrors> {
        strip(&mut values.certificate_delivery_address);
        strip(&mut values.special_diet_other);
        strip(&mut values.prior_experience);
        strip(&mut values.shift_wishes);
        strip(&mut values.free_text);

        let mut errors = FieldErrors::default();
        if values.want_certificate && values.certificate_delivery_address.is_empty() {
            errors.add("certificate_delivery_address", CERTIFICATE_ADDRESS_REQUIRED);
        }
        errors.into_result()
    }
}

/// Dietary part of the signup extras, asked from programme hosts.
#[derive(Serialize, FromForm, FieldNames, Clone, Debug, PartialEq)]
pub struct ProgrammeSignupExtraValues {
    #[field(default = Vec::new())]
    pub special_diet: Vec<SpecialDiet>,
    #[field(default = String::new())]
    pub special_diet_other: String,
}

pub struct ProgrammeSignupExtraForm {
    fields: Fields,
}
impl ProgrammeSignupExtraForm {
    pub fn new() -> anyhow::Result<Self> {
        let fields = fields_for_model(SIGNUP_EXTRA_FIELDS, ProgrammeSignupExtraValues::FIELD_NAMES, &[
            ("special_diet", Widget::CheckboxSelectMultiple),
        ])?;
        Ok(Self { fields })
    }
}
impl ModelForm for ProgrammeSignupExtraForm {
    type Values = ProgrammeSignupExtraValues;

    fn fields(&self) -> &Fields {
        &self.fields
    }
}

pub async fn submit_signup_extra(
    form: &SignupExtraForm,
    mut bound: BoundForm<SignupExtraValues>,
    event_id: EventId,
    person_id: PersonId,
    pool: &SqlitePool,
) -> anyhow::Result<Submission<SignupExtraRecord>> {
    if !form.full_clean(&mut bound) {
        debug!("Signup extra rejected, person id: {person_id}, fields: {}", bound.errors.fields().join(", "));
        return Ok(Submission::Invalid { data: bound.data, errors: bound.errors });
    }
    let Some(values) = bound.values else {
        return Ok(Submission::Invalid { data: bound.data, errors: bound.errors });
    };
    let mut rec = load_signup_extra(event_id, person_id, pool).await?
        .unwrap_or_else(|| SignupExtraRecord::new(event_id, person_id));
    values.apply(&mut rec);
    rec.id = save_signup_extra(&rec, pool).await?;
    Ok(Submission::Saved(rec))
}

pub async fn submit_programme_signup_extra(
    form: &ProgrammeSignupExtraForm,
    mut bound: BoundForm<ProgrammeSignupExtraValues>,
    event_id: EventId,
    person_id: PersonId,
    pool: &SqlitePool,
) -> anyhow::Result<Submission<SignupExtraRecord>> {
    if !form.full_clean(&mut bound) {
        return Ok(Submission::Invalid { data: bound.data, errors: bound.errors });
    }
    let Some(mut values) = bound.values else {
        return Ok(Submission::Invalid { data: bound.data, errors: bound.errors });
    };
    strip(&mut values.special_diet_other);
    let mut rec = load_signup_extra(event_id, person_id, pool).await?
        .unwrap_or_else(|| SignupExtraRecord::new(event_id, person_id));
    rec.special_diet = values.special_diet;
    rec.special_diet_other = values.special_diet_other;
    rec.id = save_signup_extra(&rec, pool).await?;
    Ok(Submission::Saved(rec))
}

async fn initial_data(event_id: EventId, person_id: PersonId, pool: &SqlitePool) -> Result<FormData, Custom<String>> {
    let rec = load_signup_extra(event_id, person_id, pool).await
        .map_err(sqlx_to_custom_error)?
        .unwrap_or_else(|| SignupExtraRecord::new(event_id, person_id));
    FormData::from_serialize(&rec).map_err(anyhow_to_custom_error)
}

fn render_page(
    template: &'static str,
    form: &impl ModelForm,
    event: &EventRecord,
    person_id: PersonId,
    data: &FormData,
    errors: &FieldErrors,
) -> Result<Template, Custom<String>> {
    let items = form.render(data, errors).map_err(anyhow_to_custom_error)?;
    Ok(Template::render(template, context! {
        event,
        person_id,
        items,
        non_field_errors: errors.get(NON_FIELD_ERRORS),
    }))
}

#[get("/event/<event_slug>/signup-extra/<person_id>")]
async fn get_signup_extra(event_slug: &str, person_id: PersonId, db: &State<DbPool>) -> Result<Template, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = SignupExtraForm::new().map_err(anyhow_to_custom_error)?;
    let data = initial_data(event.id, person_id, &db.0).await?;
    render_page("signup-extra", &form, &event, person_id, &data, &FieldErrors::default())
}

#[post("/event/<event_slug>/signup-extra/<person_id>", data = "<values>")]
async fn post_signup_extra(
    event_slug: &str,
    person_id: PersonId,
    values: Form<Contextual<'_, SignupExtraValues>>,
    db: &State<DbPool>,
) -> Result<Either<Redirect, Custom<Template>>, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = SignupExtraForm::new().map_err(anyhow_to_custom_error)?;
    let bound = BoundForm::from_contextual(values.into_inner(), &form.fields().names());
    match submit_signup_extra(&form, bound, event.id, person_id, &db.0).await.map_err(anyhow_to_custom_error)? {
        Submission::Saved(_) => Ok(Either::Left(Redirect::to(format!("/event/{event_slug}/signup-extra/{person_id}")))),
        Submission::Invalid { data, errors } => {
            let page = render_page("signup-extra", &form, &event, person_id, &data, &errors)?;
            Ok(Either::Right(Custom(Status::UnprocessableEntity, page)))
        }
    }
}

#[get("/event/<event_slug>/signup-extra/<person_id>/programme")]
async fn get_programme_signup_extra(event_slug: &str, person_id: PersonId, db: &State<DbPool>) -> Result<Template, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = ProgrammeSignupExtraForm::new().map_err(anyhow_to_custom_error)?;
    let data = initial_data(event.id, person_id, &db.0).await?;
    render_page("programme-signup-extra", &form, &event, person_id, &data, &FieldErrors::default())
}

#[post("/event/<event_slug>/signup-extra/<person_id>/programme", data = "<values>")]
async fn post_programme_signup_extra(
    event_slug: &str,
    person_id: PersonId,
    values: Form<Contextual<'_, ProgrammeSignupExtraValues>>,
    db: &State<DbPool>,
) -> Result<Either<Redirect, Custom<Template>>, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = ProgrammeSignupExtraForm::new().map_err(anyhow_to_custom_error)?;
    let bound = BoundForm::from_contextual(values.into_inner(), &form.fields().names());
    match submit_programme_signup_extra(&form, bound, event.id, person_id, &db.0).await.map_err(anyhow_to_custom_error)? {
        Submission::Saved(_) => Ok(Either::Left(Redirect::to(format!("/event/{event_slug}/signup-extra/{person_id}/programme")))),
        Submission::Invalid { data, errors } => {
            let page = render_page("programme-signup-extra", &form, &event, person_id, &data, &errors)?;
            Ok(Either::Right(Custom(Status::UnprocessableEntity, page)))
        }
    }
}

#[get("/api/event/<event_slug>/signup-extra/<person_id>")]
async fn api_get_signup_extra(event_slug: &str, person_id: PersonId, db: &State<DbPool>) -> Result<Json<SignupExtraRecord>, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let rec = load_signup_extra(event.id, person_id, &db.0).await
        .map_err(sqlx_to_custom_error)?
        .ok_or_else(|| not_found(format!("Signup extra of person {person_id}")))?;
    Ok(Json(rec))
}

type ApiSubmission = Result<Json<SignupExtraRecord>, Custom<Json<FieldErrors>>>;

fn api_response(submission: Submission<SignupExtraRecord>) -> ApiSubmission {
    match submission {
        Submission::Saved(rec) => Ok(Json(rec)),
        Submission::Invalid { errors, .. } => Err(Custom(Status::UnprocessableEntity, Json(errors))),
    }
}

#[post("/api/event/<event_slug>/signup-extra/<person_id>", data = "<values>")]
async fn api_post_signup_extra(
    event_slug: &str,
    person_id: PersonId,
    values: Form<Contextual<'_, SignupExtraValues>>,
    db: &State<DbPool>,
) -> Result<ApiSubmission, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = SignupExtraForm::new().map_err(anyhow_to_custom_error)?;
    let bound = BoundForm::from_contextual(values.into_inner(), &form.fields().names());
    let submission = submit_signup_extra(&form, bound, event.id, person_id, &db.0).await.map_err(anyhow_to_custom_error)?;
    Ok(api_response(submission))
}

#[post("/api/event/<event_slug>/signup-extra/<person_id>/programme", data = "<values>")]
async fn api_post_programme_signup_extra(
    event_slug: &str,
    person_id: PersonId,
    values: Form<Contextual<'_, ProgrammeSignupExtraValues>>,
    db: &State<DbPool>,
) -> Result<ApiSubmission, Custom<String>> {
    let event = load_event(event_slug, db).await?;
    let form = ProgrammeSignupExtraForm::new().map_err(anyhow_to_custom_error)?;
    let bound = BoundForm::from_contextual(values.into_inner(), &form.fields().names());
    let submission = submit_programme_signup_extra(&form, bound, event.id, person_id, &db.0).await.map_err(anyhow_to_custom_error)?;
    Ok(api_response(submission))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
        get_signup_extra,
        post_signup_extra,
        get_programme_signup_extra,
        post_programme_signup_extra,
        api_get_signup_extra,
        api_post_signup_extra,
        api_post_programme_signup_extra,
    ])
}
