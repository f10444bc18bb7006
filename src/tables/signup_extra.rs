use std::fmt::{Display, Formatter};
use std::str::FromStr;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use crate::event::{EventId, PersonId};
use crate::forms::{FieldKind, ModelField};
use crate::impl_sqlx_text_enum_encode_decode;

#[derive(Serialize, Deserialize, FromFormField, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftType {
    #[field(value = "yksipitka")]
    #[serde(rename = "yksipitka")]
    OneLong,
    #[field(value = "montalyhytta")]
    #[serde(rename = "montalyhytta")]
    ManyShort,
    #[field(value = "kaikkikay")]
    #[serde(rename = "kaikkikay")]
    Either,
}
impl ShiftType {
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("yksipitka", "Yksi pitkä vuoro"),
        ("montalyhytta", "Monta lyhyempää vuoroa"),
        ("kaikkikay", "Kumpi tahansa käy"),
    ];
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::OneLong => "yksipitka",
            ShiftType::ManyShort => "montalyhytta",
            ShiftType::Either => "kaikkikay",
        }
    }
}
impl FromStr for ShiftType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yksipitka" => Ok(ShiftType::OneLong),
            "montalyhytta" => Ok(ShiftType::ManyShort),
            "kaikkikay" => Ok(ShiftType::Either),
            _ => Err(anyhow!("Invalid shift type: {s}")),
        }
    }
}
impl Display for ShiftType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
impl_sqlx_text_enum_encode_decode!(ShiftType);

#[derive(Serialize, Deserialize, FromFormField, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpecialDiet {
    #[field(value = "gluteeniton")]
    #[serde(rename = "gluteeniton")]
    GlutenFree,
    #[field(value = "laktoositon")]
    #[serde(rename = "laktoositon")]
    LactoseFree,
    #[field(value = "maidoton")]
    #[serde(rename = "maidoton")]
    MilkFree,
    #[field(value = "vegaaninen")]
    #[serde(rename = "vegaaninen")]
    Vegan,
    #[field(value = "lakto-ovo-vegaaninen")]
    #[serde(rename = "lakto-ovo-vegaaninen")]
    LactoOvoVegetarian,
}
impl SpecialDiet {
    pub const CHOICES: &'static [(&'static str, &'static str)] = &[
        ("gluteeniton", "Gluteeniton"),
        ("laktoositon", "Laktoositon"),
        ("maidoton", "Maidoton"),
        ("vegaaninen", "Vegaaninen"),
        ("lakto-ovo-vegaaninen", "Lakto-ovo-vegaaninen"),
    ];
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialDiet::GlutenFree => "gluteeniton",
            SpecialDiet::LactoseFree => "laktoositon",
            SpecialDiet::MilkFree => "maidoton",
            SpecialDiet::Vegan => "vegaaninen",
            SpecialDiet::LactoOvoVegetarian => "lakto-ovo-vegaaninen",
        }
    }
}
impl FromStr for SpecialDiet {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gluteeniton" => Ok(SpecialDiet::GlutenFree),
            "laktoositon" => Ok(SpecialDiet::LactoseFree),
            "maidoton" => Ok(SpecialDiet::MilkFree),
            "vegaaninen" => Ok(SpecialDiet::Vegan),
            "lakto-ovo-vegaaninen" => Ok(SpecialDiet::LactoOvoVegetarian),
            _ => Err(anyhow!("Invalid special diet: {s}")),
        }
    }
}
impl_sqlx_text_enum_encode_decode!(SpecialDiet);

pub const SIGNUP_EXTRA_FIELDS: &[ModelField] = &[
    ModelField::new("shift_type", "Toivottu työvuoron pituus", FieldKind::Choice(ShiftType::CHOICES))
        .help("Haluatko tehdä yhden pitkän työvuoron vaiko monta lyhyempää vuoroa?"),
    ModelField::new("want_certificate", "Haluan todistuksen työskentelystäni", FieldKind::Boolean),
    ModelField::new("certificate_delivery_address", "Työtodistuksen toimitusosoite", FieldKind::Text)
        .blank()
        .help("Jos haluat työtodistuksen, täytä tähän kenttään postiosoite (katuosoite, postinumero ja postitoimipaikka) johon haluat todistuksen toimitettavan."),
    ModelField::new("special_diet", "Erikoisruokavalio", FieldKind::MultipleChoice(SpecialDiet::CHOICES)).blank(),
    ModelField::new("special_diet_other", "Muu erikoisruokavalio", FieldKind::Text)
        .blank()
        .help("Jos noudatat erikoisruokavaliota, jota ei ole yllä olevassa listassa, ilmoita se tässä."),
    ModelField::new("prior_experience", "Työkokemus", FieldKind::Text)
        .blank()
        .help("Kerro tässä kentässä, jos sinulla on aiempaa kokemusta vastaavista tehtävistä tai muuta sellaista työkokemusta, josta arvioit olevan hyötyä hakemassasi tehtävässä."),
    ModelField::new("shift_wishes", "Alustavat työvuorotoiveet", FieldKind::Text)
        .blank()
        .help("Jos tiedät nyt jo, ettet pääse paikalle johonkin tiettyyn aikaan tai haluat esimerkiksi osallistua johonkin tiettyyn ohjelmanumeroon, mainitse siitä tässä."),
    ModelField::new("free_text", "Vapaa alue", FieldKind::Text)
        .blank()
        .help("Jos haluat sanoa hakemuksesi käsittelijöille jotain sellaista, jolle ei ole omaa kenttää yllä, käytä tätä kenttää."),
];

#[derive(Serialize, Deserialize, FromRow, Clone, Debug, PartialEq)]
pub struct SignupExtraRecord {
    pub id: i64,
    pub event_id: EventId,
    pub person_id: PersonId,
    pub shift_type: Option<ShiftType>,
    pub want_certificate: bool,
    pub certificate_delivery_address: String,
    #[sqlx(skip)]
    #[serde(default)]
    pub special_diet: Vec<SpecialDiet>,
    pub special_diet_other: String,
    pub prior_experience: String,
    pub shift_wishes: String,
    pub free_text: String,
}
impl SignupExtraRecord {
    pub fn new(event_id: EventId, person_id: PersonId) -> Self {
        Self {
            id: 0,
            event_id,
            person_id,
            shift_type: None,
            want_certificate: false,
            certificate_delivery_address: "".to_string(),
            special_diet: vec![],
            special_diet_other: "".to_string(),
            prior_experience: "".to_string(),
            shift_wishes: "".to_string(),
            free_text: "".to_string(),
        }
    }
}

pub async fn load_signup_extra(event_id: EventId, person_id: PersonId, pool: &SqlitePool) -> Result<Option<SignupExtraRecord>, sqlx::Error> {
    let rec = sqlx::query_as::<_, SignupExtraRecord>("SELECT * FROM ropecon2019_signupextra WHERE event_id=? AND person_id=?")
        .bind(event_id)
        .bind(person_id)
        .fetch_optional(pool)
        .await?;
    let Some(mut rec) = rec else {
        return Ok(None);
    };
    rec.special_diet = sqlx::query_as::<_, (SpecialDiet,)>("SELECT special_diet FROM ropecon2019_signupextra_special_diet WHERE signupextra_id=? ORDER BY special_diet")
        .bind(rec.id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|d| d.0)
        .collect();
    rec.special_diet.sort();
    Ok(Some(rec))
}

/// Inserts or updates the record for (event, person), replacing its special diets.
pub async fn save_signup_extra(rec: &SignupExtraRecord, pool: &SqlitePool) -> anyhow::Result<i64> {
    let mut txn = pool.begin().await?;
    let id: (i64,) = sqlx::query_as("INSERT INTO ropecon2019_signupextra \
            (event_id, person_id, shift_type, want_certificate, certificate_delivery_address, special_diet_other, prior_experience, shift_wishes, free_text) \
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
            ON CONFLICT (event_id, person_id) DO UPDATE SET \
            shift_type=excluded.shift_type, \
            want_certificate=excluded.want_certificate, \
            certificate_delivery_address=excluded.certificate_delivery_address, \
            special_diet_other=excluded.special_diet_other, \
            prior_experience=excluded.prior_experience, \
            shift_wishes=excluded.shift_wishes, \
            free_text=excluded.free_text \
            RETURNING id")
        .bind(rec.event_id)
        .bind(rec.person_id)
        .bind(rec.shift_type)
        .bind(rec.want_certificate)
        .bind(&rec.certificate_delivery_address)
        .bind(&rec.special_diet_other)
        .bind(&rec.prior_experience)
        .bind(&rec.shift_wishes)
        .bind(&rec.free_text)
        .fetch_one(&mut *txn).await?;
    sqlx::query("DELETE FROM ropecon2019_signupextra_special_diet WHERE signupextra_id=?")
        .bind(id.0)
        .execute(&mut *txn).await?;
    for diet in &rec.special_diet {
        sqlx::query("INSERT OR IGNORE INTO ropecon2019_signupextra_special_diet (signupextra_id, special_diet) VALUES (?, ?)")
            .bind(id.0)
            .bind(diet)
            .execute(&mut *txn).await?;
    }
    txn.commit().await?;
    info!("Signup extra saved, event id: {}, person id: {}, id: {}", rec.event_id, rec.person_id, id.0);
    Ok(id.0)
}
