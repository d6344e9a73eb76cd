//! Fixed Spanish lexicons: stop words, entity categories with their column
//! templates, and column-type keywords.

use std::sync::LazyLock;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::text::singularize_word;
use crate::Column;

const STOPWORDS: &[&str] = &[
    "ademas", "aplicacion", "aplicaciones", "app", "asi", "base", "bases", "cada", "como",
    "con", "crea", "crear", "creo", "datos", "debe", "deben", "del", "detalle", "detalles",
    "diagrama", "diagramas", "disena", "disenar", "diseno", "donde", "estructura", "favor",
    "genera", "generar", "gestion", "gestiona", "gestionar", "haz", "hacer", "hace", "incluya",
    "incluyan", "incluye", "incluyen", "informacion", "las", "los", "maneja", "manejar",
    "maneje", "modelo", "modelos", "necesaria", "necesario", "necesita", "necesito", "para",
    "pertenece", "pertenecen", "pertenecer", "plataforma", "por", "principal", "principales",
    "que", "quiere", "quiero", "relacion", "relaciones", "requiere", "requiero", "sistema",
    "sistemas", "solucion", "solucionar", "tabla", "tablas", "tambien", "tener", "tiene",
    "tipo", "tipos", "trabajan", "trabajar", "una", "unas", "uno", "unos", "usar", "utilizar",
];

const TYPE_KEYWORDS: &[&str] = &[
    "entero", "integer", "int", "texto", "text", "string", "varchar", "char", "decimal",
    "numeric", "numero", "number", "float", "double", "fecha", "date", "datetime", "hora",
    "time", "boolean", "bool", "pk", "fk", "primary", "foreign",
];

static STOPWORD_SET: LazyLock<FxHashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

static TYPE_KEYWORD_SET: LazyLock<FxHashSet<&'static str>> =
    LazyLock::new(|| TYPE_KEYWORDS.iter().copied().collect());

#[must_use]
pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Tokens that describe a column's type or key role rather than its name.
#[must_use]
pub fn is_type_keyword(token: &str) -> bool {
    TYPE_KEYWORD_SET.contains(token)
}

/// Semantic family of an entity noun; selects the starter columns of a new node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Person,
    Event,
    Location,
    Item,
    Document,
    Organization,
    #[default]
    Default,
}

/// `(name, type, nullable)` of one template column.
pub type ColumnTemplate = (&'static str, &'static str, bool);

impl Category {
    /// Keyword lookup order; the first category containing the noun wins.
    const KEYWORD_ORDER: [Self; 6] = [
        Self::Person,
        Self::Event,
        Self::Location,
        Self::Item,
        Self::Document,
        Self::Organization,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Event => "event",
            Self::Location => "location",
            Self::Item => "item",
            Self::Document => "document",
            Self::Organization => "organization",
            Self::Default => "default",
        }
    }

    const fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Person => &[
                "administrador", "alumno", "cliente", "doctor", "docente", "empleado",
                "estudiante", "jefe", "medico", "paciente", "personal", "profesor", "tecnico",
                "usuario",
            ],
            Self::Event => &[
                "cita", "clase", "consulta", "entrega", "ingreso", "inscripcion", "matricula",
                "pago", "pedido", "reserva", "turno", "venta",
            ],
            Self::Location => &[
                "aula", "campus", "departamento", "habitacion", "laboratorio", "oficina",
                "planta", "sala", "sede",
            ],
            Self::Item => &[
                "activo", "curso", "equipo", "herramienta", "inventario", "libro", "material",
                "medicamento", "producto", "recurso", "servicio",
            ],
            Self::Document => &["expediente", "factura", "historial", "reporte", "solicitud"],
            Self::Organization => &[
                "clinica", "empresa", "escuela", "facultad", "hospital", "instituto", "tienda",
                "universidad",
            ],
            Self::Default => &[],
        }
    }

    /// Columns appended after the `id` primary key of a synthesized node.
    #[must_use]
    pub const fn template(self) -> &'static [ColumnTemplate] {
        match self {
            Self::Person => &[
                ("nombre", "VARCHAR(150)", false),
                ("apellido", "VARCHAR(150)", true),
                ("email", "VARCHAR(150)", true),
                ("telefono", "VARCHAR(50)", true),
            ],
            Self::Event => &[
                ("fecha", "DATETIME", false),
                ("estado", "VARCHAR(50)", true),
                ("descripcion", "TEXT", true),
            ],
            Self::Location => &[
                ("nombre", "VARCHAR(120)", false),
                ("ubicacion", "VARCHAR(150)", true),
                ("capacidad", "INT", true),
            ],
            Self::Item => &[
                ("nombre", "VARCHAR(150)", false),
                ("descripcion", "TEXT", true),
                ("cantidad", "INT", true),
                ("precio", "DECIMAL(10,2)", true),
            ],
            Self::Document => &[
                ("titulo", "VARCHAR(180)", false),
                ("descripcion", "TEXT", true),
                ("fecha", "DATE", true),
            ],
            Self::Organization => &[
                ("nombre", "VARCHAR(180)", false),
                ("direccion", "VARCHAR(200)", true),
                ("telefono", "VARCHAR(60)", true),
            ],
            Self::Default => &[
                ("nombre", "VARCHAR(150)", false),
                ("descripcion", "TEXT", true),
            ],
        }
    }
}

/// Classify a normalized noun: keyword sets first, then suffix fallbacks.
#[must_use]
pub fn categorize_entity(token: &str) -> Category {
    let base = singularize_word(token);
    if let Some(category) = Category::KEYWORD_ORDER
        .into_iter()
        .find(|category| category.keywords().contains(&base.as_str()))
    {
        return category;
    }
    if ["cion", "sion", "miento"]
        .iter()
        .any(|suffix| base.ends_with(suffix))
    {
        return Category::Event;
    }
    if ["ista", "nte", "dor", "dora", "ero", "era"]
        .iter()
        .any(|suffix| base.ends_with(suffix))
    {
        return Category::Person;
    }
    if base.ends_with("orio") || base.ends_with("oria") {
        return Category::Location;
    }
    Category::Default
}

/// `id` primary key followed by the category template, ids prefixed by `slug`.
#[must_use]
pub fn build_base_columns(slug: &str, category: Category) -> Vec<Column> {
    let mut columns = Vec::with_capacity(category.template().len() + 1);
    columns.push(Column::primary_key(format!("{slug}-id")));
    for (name, column_type, nullable) in category.template() {
        columns.push(Column::new(
            format!("{slug}-{}", name.replace('_', "-")),
            *name,
            *column_type,
            *nullable,
        ));
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::{Category, build_base_columns, categorize_entity, is_stopword, is_type_keyword};

    #[test]
    fn keyword_categories_match_singular_and_plural() {
        assert_eq!(categorize_entity("clientes"), Category::Person);
        assert_eq!(categorize_entity("pacientes"), Category::Person);
        assert_eq!(categorize_entity("pedidos"), Category::Event);
        assert_eq!(categorize_entity("aulas"), Category::Location);
        assert_eq!(categorize_entity("productos"), Category::Item);
        assert_eq!(categorize_entity("facturas"), Category::Document);
        assert_eq!(categorize_entity("universidades"), Category::Organization);
    }

    #[test]
    fn suffix_fallbacks_classify_unknown_nouns() {
        assert_eq!(categorize_entity("evaluacion"), Category::Event);
        assert_eq!(categorize_entity("mantenimiento"), Category::Event);
        assert_eq!(categorize_entity("vendedores"), Category::Person);
        assert_eq!(categorize_entity("dentista"), Category::Person);
        assert_eq!(categorize_entity("consultorio"), Category::Location);
        assert_eq!(categorize_entity("mascota"), Category::Default);
    }

    #[test]
    fn base_columns_start_with_primary_key() {
        let columns = build_base_columns("alumno", Category::Person);
        let names: Vec<_> = columns.iter().map(|column| column.name.as_str()).collect();
        assert_eq!(names, ["id", "nombre", "apellido", "email", "telefono"]);
        assert!(columns[0].pk);
        assert!(!columns[0].nullable);
        assert_eq!(columns[0].column_type, "INT");
        assert_eq!(columns[1].id, "alumno-nombre");
        assert!(!columns[1].nullable);
        assert!(columns.iter().skip(1).all(|column| !column.pk));
    }

    #[test]
    fn default_template_is_name_and_description() {
        let columns = build_base_columns("x", Category::Default);
        let names: Vec<_> = columns.iter().map(|column| column.name.as_str()).collect();
        assert_eq!(names, ["id", "nombre", "descripcion"]);
    }

    #[test]
    fn lexicon_lookups() {
        assert!(is_stopword("tabla"));
        assert!(!is_stopword("cliente"));
        assert!(is_type_keyword("varchar"));
        assert!(is_type_keyword("pk"));
        assert!(!is_type_keyword("email"));
    }
}
