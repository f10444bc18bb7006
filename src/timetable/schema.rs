//! Snapshot of the timetable schema as of the tag style migration.
//!
//! Mirrors `db/migrations`, so code can reason about the timetable tables
//! without querying the database, and startup can detect a database whose
//! schema drifted from what this build expects.

use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    AutoField,
    CharField,
    TextField,
    EmailField,
    IntegerField,
    BooleanField,
    DateTimeField,
    ForeignKey,
    ManyToManyField,
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct FieldSnapshot {
    pub name: &'static str,
    pub field_type: FieldType,
    pub max_length: Option<usize>,
    pub default: Option<&'static str>,
    pub blank: bool,
    pub unique: bool,
    /// Target model of a relation.
    pub to: Option<&'static str>,
    /// Intermediate model of a many-to-many relation.
    pub through: Option<&'static str>,
}
impl FieldSnapshot {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type, max_length: None, default: None, blank: false, unique: false, to: None, through: None }
    }
    const fn auto() -> Self {
        Self::new("id", FieldType::AutoField)
    }
    const fn char(name: &'static str, max_length: usize) -> Self {
        let mut f = Self::new(name, FieldType::CharField);
        f.max_length = Some(max_length);
        f
    }
    const fn email(name: &'static str, max_length: usize) -> Self {
        let mut f = Self::new(name, FieldType::EmailField);
        f.max_length = Some(max_length);
        f
    }
    const fn foreign_key(name: &'static str, to: &'static str) -> Self {
        let mut f = Self::new(name, FieldType::ForeignKey);
        f.to = Some(to);
        f
    }
    const fn many_to_many(name: &'static str, to: &'static str) -> Self {
        let mut f = Self::new(name, FieldType::ManyToManyField);
        f.to = Some(to);
        f
    }
    const fn through(mut self, through: &'static str) -> Self {
        self.through = Some(through);
        self
    }
    const fn default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
    const fn blank(mut self) -> Self {
        self.blank = true;
        self
    }
    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Column holding the field in the model table, many-to-many fields live in a join table.
    pub fn column(&self) -> Option<String> {
        match self.field_type {
            FieldType::ManyToManyField => None,
            FieldType::ForeignKey => Some(format!("{}_id", self.name)),
            _ => Some(self.name.to_string()),
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct ModelSnapshot {
    pub object_name: &'static str,
    pub table: &'static str,
    pub ordering: &'static [&'static str],
    pub fields: &'static [FieldSnapshot],
}
impl ModelSnapshot {
    pub fn field(&self, name: &str) -> Option<&FieldSnapshot> {
        self.fields.iter().find(|f| f.name == name)
    }
    pub fn columns(&self) -> Vec<String> {
        self.fields.iter().filter_map(FieldSnapshot::column).collect()
    }
}

use FieldType::*;

pub const SNAPSHOT: &[ModelSnapshot] = &[
    ModelSnapshot {
        object_name: "Category",
        table: "timetable_category",
        ordering: &["title"],
        fields: &[
            FieldSnapshot::auto(),
            FieldSnapshot::new("notes", TextField).blank(),
            FieldSnapshot::char("style", 15),
            FieldSnapshot::char("title", 1023),
        ],
    },
    ModelSnapshot {
        object_name: "Person",
        table: "timetable_person",
        ordering: &["surname"],
        fields: &[
            FieldSnapshot::new("anonymous", BooleanField).default("False"),
            FieldSnapshot::email("email", 254).blank(),
            FieldSnapshot::char("first_name", 1023),
            FieldSnapshot::auto(),
            FieldSnapshot::char("nick", 1023).blank(),
            FieldSnapshot::new("notes", TextField).blank(),
            FieldSnapshot::char("phone", 255).blank(),
            FieldSnapshot::char("surname", 1023),
        ],
    },
    ModelSnapshot {
        object_name: "Programme",
        table: "timetable_programme",
        ordering: &["start_time", "room"],
        fields: &[
            FieldSnapshot::foreign_key("category", "Category"),
            FieldSnapshot::new("description", TextField),
            FieldSnapshot::new("hilight", BooleanField).default("False"),
            FieldSnapshot::auto(),
            FieldSnapshot::new("length", IntegerField),
            FieldSnapshot::new("notes", TextField).blank(),
            FieldSnapshot::many_to_many("organizers", "Person").through("ProgrammeRole"),
            FieldSnapshot::new("public", BooleanField).default("True"),
            FieldSnapshot::foreign_key("room", "Room"),
            FieldSnapshot::new("start_time", DateTimeField),
            FieldSnapshot::many_to_many("tags", "Tag"),
            FieldSnapshot::char("title", 1023),
        ],
    },
    ModelSnapshot {
        object_name: "ProgrammeRole",
        table: "timetable_programmerole",
        ordering: &[],
        fields: &[
            FieldSnapshot::auto(),
            FieldSnapshot::foreign_key("person", "Person"),
            FieldSnapshot::foreign_key("programme", "Programme"),
            FieldSnapshot::foreign_key("role", "Role"),
        ],
    },
    ModelSnapshot {
        object_name: "Role",
        table: "timetable_role",
        ordering: &["title"],
        fields: &[
            FieldSnapshot::auto(),
            FieldSnapshot::new("require_contact_info", BooleanField).default("True"),
            FieldSnapshot::char("title", 1023),
        ],
    },
    ModelSnapshot {
        object_name: "Room",
        table: "timetable_room",
        ordering: &["order"],
        fields: &[
            FieldSnapshot::auto(),
            FieldSnapshot::char("name", 1023),
            FieldSnapshot::new("notes", TextField).blank(),
            FieldSnapshot::new("order", IntegerField).unique(),
            FieldSnapshot::new("public", BooleanField).default("True"),
        ],
    },
    ModelSnapshot {
        object_name: "Tag",
        table: "timetable_tag",
        ordering: &["order"],
        fields: &[
            FieldSnapshot::auto(),
            FieldSnapshot::new("order", IntegerField).default("0"),
            FieldSnapshot::char("style", 15).default("label-default"),
            FieldSnapshot::char("title", 15),
        ],
    },
    ModelSnapshot {
        object_name: "View",
        table: "timetable_view",
        ordering: &["order"],
        fields: &[
            FieldSnapshot::auto(),
            FieldSnapshot::char("name", 32),
            FieldSnapshot::new("order", IntegerField).default("0"),
            FieldSnapshot::new("public", BooleanField).default("True"),
            FieldSnapshot::many_to_many("rooms", "Room"),
        ],
    },
];

pub fn model(object_name: &str) -> Option<&'static ModelSnapshot> {
    SNAPSHOT.iter().find(|m| m.object_name == object_name)
}

/// Returns `table.column` for every snapshot column the database lacks.
pub async fn verify(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let mut missing = vec![];
    for model in SNAPSHOT {
        let columns = sqlx::query_as::<_, (String,)>("SELECT name FROM pragma_table_info(?)")
            .bind(model.table)
            .fetch_all(pool)
            .await?;
        for column in model.columns() {
            if !columns.iter().any(|c| c.0 == column) {
                missing.push(format!("{}.{column}", model.table));
            }
        }
    }
    Ok(missing)
}
