//! Fresh diagrams built from a prompt alone: relation-first, dynamic noun
//! synthesis, and the minimal default.

use std::sync::LazyLock;

use er_core::{
    Column, Edge, Graph, GridLayout, Multiplicity, Node, Position, RelationKind,
    build_base_columns, categorize_entity, fold_text, is_stopword, normalize_text, normalize_token,
    singularize_word, slugify, titleize, word_forms,
};
use er_intent::RelationAction;
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::mutator::{resolve_or_create, unique_id, upsert_relation_edge};
use crate::resolver::LabelLookup;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Connectors of `child <conn> parent`.
const CHILD_OF: &[&str] = &["de", "del", "para", "con", "sobre"];
/// Connectors of `parent <conn> child`.
const PARENT_OF: &[&str] = &["con", "para", "de"];

/// Build a graph from relation actions alone; `None` when no edge results.
#[must_use]
pub fn synthesize_relation_first(relations: &[RelationAction], grid: &GridLayout) -> Option<Graph> {
    let mut graph = Graph::default();
    let mut lookup = LabelLookup::default();
    for action in relations {
        if action.source.is_empty() || action.target.is_empty() {
            continue;
        }
        let (source, _) = resolve_or_create(&mut graph, &mut lookup, &action.source, grid);
        let (target, _) = resolve_or_create(&mut graph, &mut lookup, &action.target, grid);
        let action = RelationAction {
            kind: Some(action.kind.unwrap_or(RelationKind::Simple)),
            source_mult: Some(action.source_mult.unwrap_or(Multiplicity::One)),
            target_mult: Some(action.target_mult.unwrap_or(Multiplicity::Many)),
            ..action.clone()
        };
        let source_id = graph.nodes[source].id.clone();
        let target_id = graph.nodes[target].id.clone();
        upsert_relation_edge(&mut graph, &source_id, &target_id, &action, true);
    }
    (!graph.edges.is_empty()).then_some(graph)
}

/// Candidate entity nouns in prompt order, at most `max_entities`.
///
/// A word qualifies when its normalized form has three or more characters,
/// is not numeric, and none of its number variants is a stop word or was
/// already taken by an earlier candidate.
#[must_use]
pub fn extract_entity_candidates(prompt: &str, max_entities: usize) -> Vec<String> {
    let mut entities = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    for word in WORD.find_iter(prompt).map(|found| found.as_str()) {
        if entities.len() >= max_entities {
            break;
        }
        let normalized = normalize_token(word);
        if normalized.len() < 3 || normalized.chars().all(|ch| ch.is_ascii_digit()) {
            continue;
        }
        let variants: Vec<String> = [
            normalized.clone(),
            singularize_word(&normalized),
            normalized.trim_end_matches('s').to_string(),
        ]
        .into_iter()
        .filter(|variant| !variant.is_empty())
        .collect();
        if variants
            .iter()
            .any(|variant| is_stopword(variant) || seen.contains(variant))
        {
            continue;
        }
        seen.extend(variants);
        entities.push(word.to_string());
    }
    entities
}

struct Entity {
    slug: String,
    label: String,
    normalized: String,
    columns: Vec<Column>,
}

/// Star-shaped diagram over the nouns of a free-text prompt.
///
/// Each entity after the first hangs off the first entity whose phrasing
/// links them (`child de parent`, `parent con child`, `entre parent y
/// child`), or off the first entity when nothing links it.
#[must_use]
pub fn synthesize_dynamic(prompt: &str, max_entities: usize, grid: &GridLayout) -> Option<Graph> {
    let candidates = extract_entity_candidates(prompt, max_entities);
    if candidates.len() < 2 {
        return None;
    }

    let mut used_slugs: FxHashSet<String> = FxHashSet::default();
    let mut entities: Vec<Entity> = Vec::with_capacity(candidates.len());
    for (index, original) in candidates.iter().enumerate() {
        let normalized = normalize_token(original);
        let base = slugify(original, &format!("entidad-{}", index + 1));
        let slug = unique_id(&base, |candidate| used_slugs.contains(candidate));
        used_slugs.insert(slug.clone());
        entities.push(Entity {
            columns: build_base_columns(&slug, categorize_entity(&normalized)),
            label: titleize(original),
            slug,
            normalized,
        });
    }

    let tokens: Vec<String> = normalize_text(prompt)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let forms: Vec<Vec<String>> = entities
        .iter()
        .map(|entity| word_forms(&entity.normalized))
        .collect();

    let mut edges = Vec::with_capacity(entities.len() - 1);
    // Unordered pairs that already have an edge; mutual phrasing must not
    // add the reverse one.
    let mut related: FxHashSet<(usize, usize)> = FxHashSet::default();
    for child in 1..entities.len() {
        let parent = (0..entities.len())
            .filter(|&parent| parent != child)
            .filter(|&parent| !related.contains(&(parent.min(child), parent.max(child))))
            .find(|&parent| phrases_link(&tokens, &forms[child], &forms[parent]))
            .unwrap_or(0);
        related.insert((parent.min(child), parent.max(child)));
        let parent_singular = singularize_word(&entities[parent].normalized);
        let fk_base = if parent_singular.is_empty() {
            entities[parent].slug.clone()
        } else {
            parent_singular
        };
        let fk_name = format!("{}_id", fk_base.replace('-', "_"));
        let fk_id = format!("{}-{}-id", entities[child].slug, entities[parent].slug);
        let child_entity = &mut entities[child];
        if !child_entity.columns.iter().any(|column| column.name == fk_name) {
            child_entity
                .columns
                .push(Column::new(fk_id, fk_name, "INT", false));
        }

        let (parent_slug, child_slug) = (&entities[parent].slug, &entities[child].slug);
        let id = unique_id(&format!("edge-{parent_slug}-{child_slug}"), |candidate| {
            edges.iter().any(|edge: &Edge| edge.id == candidate)
        });
        debug!(edge = %id, "inferred relation");
        edges.push(Edge::new(
            id,
            format!("node-{parent_slug}"),
            format!("node-{child_slug}"),
            RelationKind::Simple,
            Multiplicity::One,
            Multiplicity::Many,
            "",
        ));
    }

    let nodes = entities
        .into_iter()
        .enumerate()
        .map(|(index, entity)| {
            Node::new(
                format!("node-{}", entity.slug),
                entity.label,
                entity.columns,
                grid.position(index),
            )
        })
        .collect();
    Some(Graph::new(nodes, edges))
}

/// Whether `tokens` contain `child de parent`, `parent con child` or
/// `entre parent y child` for any word form of either side.
fn phrases_link(tokens: &[String], child: &[String], parent: &[String]) -> bool {
    let is = |token: &String, forms: &[String]| forms.contains(token);
    let is_any = |token: &String, words: &[&str]| words.contains(&token.as_str());

    tokens.windows(3).any(|window| {
        (is(&window[0], child) && is_any(&window[1], CHILD_OF) && is(&window[2], parent))
            || (is(&window[0], parent) && is_any(&window[1], PARENT_OF) && is(&window[2], child))
    }) || tokens.windows(4).any(|window| {
        window[0] == "entre" && is(&window[1], parent) && window[2] == "y" && is(&window[3], child)
    })
}

const USER_RELATION_HINTS: [&str; 4] = ["relacion", "1:n", "uno a muchos", "uno muchos"];

/// Usuario/Post starter diagram; empty when neither is mentioned.
#[must_use]
pub fn default_diagram(prompt: &str) -> Graph {
    let text = fold_text(prompt);
    let mut graph = Graph::default();

    if text.contains("usuario") {
        graph.nodes.push(Node::new(
            "node-usuario-ai",
            "Usuario",
            vec![
                Column::primary_key("u-id"),
                Column::new("u-nombre", "nombre", "VARCHAR(100)", false),
                Column::new("u-email", "email", "VARCHAR(150)", false),
            ],
            Position::new(200.0, 140.0),
        ));
    }
    if text.contains("post") || text.contains("publicacion") {
        graph.nodes.push(Node::new(
            "node-post-ai",
            "Post",
            vec![
                Column::primary_key("p-id"),
                Column::new("p-user", "user_id", "INT", false),
                Column::new("p-title", "titulo", "VARCHAR(200)", false),
            ],
            Position::new(520.0, 200.0),
        ));
    }
    if graph.nodes.len() == 2 && USER_RELATION_HINTS.iter().any(|hint| text.contains(hint)) {
        graph.edges.push(Edge::new(
            "edge-usuario-post-ai",
            "node-usuario-ai",
            "node-post-ai",
            RelationKind::Simple,
            Multiplicity::One,
            Multiplicity::Many,
            "Usuario crea Post",
        ));
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::{
        default_diagram, extract_entity_candidates, synthesize_dynamic, synthesize_relation_first,
    };
    use er_core::{GridLayout, Multiplicity, Position, RelationKind};
    use er_intent::extract_relation_actions;
    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    fn dynamic_grid() -> GridLayout {
        GridLayout {
            columns: 3,
            step_x: 260.0,
            ..GridLayout::default()
        }
    }

    #[test]
    fn candidates_skip_stopwords_numbers_and_repeats() {
        let candidates = extract_entity_candidates(
            "Necesito un sistema para una veterinaria con mascotas, mascota y dueños 2024",
            8,
        );
        assert_eq!(candidates, ["veterinaria", "mascotas", "dueños"]);
        assert_eq!(
            extract_entity_candidates("veterinaria mascotas duenos citas", 2),
            ["veterinaria", "mascotas"]
        );
    }

    #[test]
    fn dynamic_diagram_links_children_to_their_parent() {
        let graph = synthesize_dynamic(
            "veterinaria con mascotas y vacunas de mascotas",
            8,
            &dynamic_grid(),
        )
        .expect("three entities");
        let ids: Vec<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, ["node-veterinaria", "node-mascotas", "node-vacunas"]);
        assert_eq!(graph.nodes[1].position, Position::new(420.0, 140.0));

        let edges: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .collect();
        assert_eq!(
            edges,
            [
                ("node-veterinaria", "node-mascotas"),
                ("node-mascotas", "node-vacunas"),
            ]
        );
        let vacunas = &graph.nodes[2];
        let fk = vacunas.columns().last().expect("fk column");
        assert_eq!(fk.name, "mascota_id");
        assert_eq!(fk.id, "vacunas-mascotas-id");
        assert!(!fk.nullable);
        assert_eq!(graph.edges[1].data.target_mult, Some(Multiplicity::Many));
    }

    #[test]
    fn unlinked_entities_hang_off_the_first() {
        let graph = synthesize_dynamic("biblioteca libros autores", 8, &dynamic_grid())
            .expect("three entities");
        assert!(graph.edges.iter().all(|edge| edge.source == "node-biblioteca"));
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.nodes[2].has_column("biblioteca_id"));
    }

    #[test]
    fn between_phrasing_sets_the_parent() {
        let graph = synthesize_dynamic("escuela, profesores, entre cursos y alumnos", 8, &dynamic_grid())
            .expect("entities");
        let alumnos = graph
            .edges
            .iter()
            .find(|edge| edge.target == "node-alumnos")
            .expect("edge to alumnos");
        assert_eq!(alumnos.source, "node-cursos");
        assert_eq!(alumnos.id, "edge-cursos-alumnos");
    }

    #[test]
    fn mutual_phrasing_keeps_one_edge_per_pair() {
        let graph = synthesize_dynamic(
            "tienda, productos de categorias, categorias de productos",
            8,
            &dynamic_grid(),
        )
        .expect("three entities");
        let edges: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .collect();
        assert_eq!(
            edges,
            [
                ("node-categorias", "node-productos"),
                ("node-tienda", "node-categorias"),
            ]
        );
        assert!(graph.nodes[2].has_column("tienda_id"));
        assert!(!graph.nodes[2].has_column("producto_id"));
    }

    #[test]
    fn fewer_than_two_entities_is_no_diagram() {
        assert!(synthesize_dynamic("hola", 8, &dynamic_grid()).is_none());
        assert!(synthesize_dynamic("quiero un sistema de mascotas", 8, &dynamic_grid()).is_none());
    }

    #[test]
    fn relation_first_builds_nodes_and_default_edges() {
        let scan = extract_relation_actions("relacion de composicion entre pedido y detalle");
        let graph = synthesize_relation_first(&scan.actions, &GridLayout::default())
            .expect("relation graph");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].label(), "Pedido");
        assert_eq!(graph.edges.len(), 1);
        let data = &graph.edges[0].data;
        assert_eq!(data.kind, Some(RelationKind::FlechaNegra));
        assert_eq!(data.source_mult, Some(Multiplicity::One));
        assert_eq!(data.target_mult, Some(Multiplicity::Many));
    }

    #[test]
    fn relation_first_defaults_the_kind_of_cardinality_edits() {
        let scan = extract_relation_actions(
            "haz la multiplicidad entre la tabla pacientes y tratamientos con * a *",
        );
        let graph = synthesize_relation_first(&scan.actions, &GridLayout::default())
            .expect("relation graph");
        let data = &graph.edges[0].data;
        assert_eq!(data.kind, Some(RelationKind::Simple));
        assert_eq!(data.source_mult, Some(Multiplicity::Many));
        assert!(synthesize_relation_first(&[], &GridLayout::default()).is_none());
    }

    #[test]
    fn default_diagram_relates_usuario_and_post() {
        let graph = default_diagram("Un usuario publica posts, relacion uno a muchos");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].label.as_deref(), Some("Usuario crea Post"));

        let graph = default_diagram("usuario y publicación");
        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.edges.is_empty());

        assert!(default_diagram("nada").is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_dynamic_edges_never_parallel(
            phrases in proptest::collection::vec(
                prop_oneof![
                    Just("productos de categorias"),
                    Just("categorias de productos"),
                    Just("clientes con pedidos"),
                    Just("pedidos del cliente"),
                    Just("entre pedidos y productos"),
                    Just("entre productos y pedidos"),
                    Just("tienda"),
                ],
                1..6,
            )
        ) {
            let prompt = phrases.join(", ");
            if let Some(graph) = synthesize_dynamic(&prompt, 8, &dynamic_grid()) {
                prop_assert!(graph.validate().is_ok());
                prop_assert_eq!(graph.edges.len(), graph.nodes.len() - 1);
                let mut pairs = FxHashSet::default();
                for edge in &graph.edges {
                    let mut pair = [edge.source.as_str(), edge.target.as_str()];
                    pair.sort_unstable();
                    prop_assert!(pairs.insert(pair), "parallel edge {:?}", pair);
                }
            }
        }
    }
}
