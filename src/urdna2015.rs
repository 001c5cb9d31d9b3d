//! RDF Dataset Normalization (URDNA2015).
//!
//! <https://json-ld.github.io/normalization/spec/>

use std::collections::BTreeMap as Map;
use std::collections::BTreeSet;

use crate::error::Error;
use crate::hash::sha256;
use crate::rdf::{BlankNodeLabel, DataSet, Position, Predicate, Statement};

/// <https://json-ld.github.io/normalization/spec/#normalization-state>
#[derive(Debug, Clone)]
pub struct NormalizationState<'a> {
    pub blank_node_to_quads: Map<&'a str, Vec<&'a Statement>>,
    pub hash_to_blank_nodes: Map<String, Vec<&'a str>>,
    pub canonical_issuer: IdentifierIssuer,
}

/// <https://json-ld.github.io/normalization/spec/#blank-node-identifier-issuer-state>
#[derive(Debug, Clone)]
pub struct IdentifierIssuer {
    pub identifier_prefix: String,
    pub identifier_counter: u64,
    /// Pairs of (issued identifier, existing identifier), in issue order.
    pub issued_identifiers_list: Vec<(String, String)>,
}

impl IdentifierIssuer {
    pub fn new(prefix: &str) -> Self {
        Self {
            identifier_prefix: prefix.to_string(),
            identifier_counter: 0,
            issued_identifiers_list: Vec::new(),
        }
    }

    pub fn find_issued_identifier(&self, existing_identifier: &str) -> Option<&str> {
        self.issued_identifiers_list
            .iter()
            .find(|(_, existing_id)| existing_id == existing_identifier)
            .map(|(issued_identifier, _)| issued_identifier.as_str())
    }

    /// <https://json-ld.github.io/normalization/spec/#issue-identifier-algorithm>
    pub fn issue(&mut self, existing_identifier: &str) -> String {
        if let Some(id) = self.find_issued_identifier(existing_identifier) {
            return id.to_string();
        }
        let issued_identifier = format!("{}{}", self.identifier_prefix, self.identifier_counter);
        self.issued_identifiers_list
            .push((issued_identifier.clone(), existing_identifier.to_string()));
        self.identifier_counter += 1;
        issued_identifier
    }

    /// Issue an identifier not bound to any existing one.
    pub fn fresh(&mut self) -> String {
        let issued_identifier = format!("{}{}", self.identifier_prefix, self.identifier_counter);
        self.identifier_counter += 1;
        issued_identifier
    }

    /// Map from existing identifier to issued identifier.
    pub fn to_map(&self) -> Map<String, String> {
        self.issued_identifiers_list
            .iter()
            .map(|(issued, existing)| (existing.clone(), issued.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct HashNDegreeQuadsOutput {
    pub hash: String,
    pub issuer: IdentifierIssuer,
}

fn digest_to_lowerhex(digest: &[u8]) -> String {
    hex::encode(digest)
}

/// <https://json-ld.github.io/normalization/spec/#hash-first-degree-quads>
pub fn hash_first_degree_quads(
    normalization_state: &NormalizationState,
    reference_blank_node_identifier: &str,
) -> String {
    let mut nquads: Vec<String> = Vec::new();
    if let Some(quads) = normalization_state
        .blank_node_to_quads
        .get(reference_blank_node_identifier)
    {
        for quad in quads {
            let mut quad: Statement = (*quad).clone();
            for label in quad.blank_node_components_mut() {
                label.0 = if label.0 == reference_blank_node_identifier {
                    "_:a".to_string()
                } else {
                    "_:z".to_string()
                };
            }
            nquads.push(String::from(&quad));
        }
    }
    nquads.sort();
    digest_to_lowerhex(&sha256(nquads.join("").as_bytes()))
}

/// Canonicalize a dataset, relabelling blank nodes `_:c14nN`.
pub fn normalize(input_dataset: &DataSet) -> Result<DataSet, Error> {
    normalize_with_issuer(input_dataset).map(|(dataset, _)| dataset)
}

/// Canonicalize a dataset, also returning the mapping from input blank node
/// labels to canonical labels.
pub fn normalize_with_issuer(
    input_dataset: &DataSet,
) -> Result<(DataSet, Map<String, String>), Error> {
    // 1
    let mut normalization_state = NormalizationState {
        blank_node_to_quads: Map::new(),
        hash_to_blank_nodes: Map::new(),
        canonical_issuer: IdentifierIssuer::new("_:c14n"),
    };
    // 2
    let input_dataset_quads = input_dataset.statements();
    for quad in input_dataset_quads.iter() {
        for blank_node_identifier in quad.blank_node_components() {
            let quads = normalization_state
                .blank_node_to_quads
                .entry(blank_node_identifier.0.as_str())
                .or_insert_with(Vec::new);
            if !quads.iter().any(|q| std::ptr::eq(*q, quad)) {
                quads.push(quad);
            }
        }
    }
    // 3
    let mut non_normalized_identifiers: BTreeSet<&str> = normalization_state
        .blank_node_to_quads
        .keys()
        .cloned()
        .collect();
    // 4
    let mut simple = true;
    // 5
    while simple {
        simple = false;
        normalization_state.hash_to_blank_nodes.clear();
        for identifier in non_normalized_identifiers.iter() {
            let hash = hash_first_degree_quads(&normalization_state, identifier);
            normalization_state
                .hash_to_blank_nodes
                .entry(hash)
                .or_insert_with(Vec::new)
                .push(*identifier);
        }
        let mut hashes_to_remove = Vec::new();
        for (hash, identifier_list) in normalization_state.hash_to_blank_nodes.iter() {
            if identifier_list.len() != 1 {
                continue;
            }
            let identifier = identifier_list[0];
            normalization_state.canonical_issuer.issue(identifier);
            non_normalized_identifiers.remove(identifier);
            hashes_to_remove.push(hash.clone());
            simple = true;
        }
        for hash in hashes_to_remove {
            normalization_state.hash_to_blank_nodes.remove(&hash);
        }
    }
    // 6
    for (_hash, identifier_list) in normalization_state.hash_to_blank_nodes.clone() {
        let mut hash_path_list: Vec<HashNDegreeQuadsOutput> = Vec::new();
        for identifier in identifier_list {
            if normalization_state
                .canonical_issuer
                .find_issued_identifier(identifier)
                .is_some()
            {
                continue;
            }
            let mut temporary_issuer = IdentifierIssuer::new("_:b");
            temporary_issuer.issue(identifier);
            hash_path_list.push(hash_n_degree_quads(
                &mut normalization_state,
                identifier,
                &temporary_issuer,
            )?);
        }
        hash_path_list.sort_by(|a, b| a.hash.cmp(&b.hash));
        for result in hash_path_list {
            for (_, existing_identifier) in result.issuer.issued_identifiers_list {
                normalization_state
                    .canonical_issuer
                    .issue(&existing_identifier);
            }
        }
    }
    // 7
    let mut normalized_dataset = DataSet::default();
    for quad in input_dataset_quads.iter() {
        let mut quad_copy = quad.clone();
        for label in quad_copy.blank_node_components_mut() {
            let canonical_identifier = normalization_state
                .canonical_issuer
                .find_issued_identifier(&label.0)
                .ok_or_else(|| {
                    Error::Canonicalization(format!("Missing identifier for {}", label.0))
                })?;
            label.0 = canonical_identifier.to_string();
        }
        normalized_dataset.add_statement(quad_copy);
    }
    // 8
    Ok((
        normalized_dataset,
        normalization_state.canonical_issuer.to_map(),
    ))
}

/// <https://json-ld.github.io/normalization/spec/#hash-n-degree-quads>
pub fn hash_n_degree_quads(
    normalization_state: &mut NormalizationState,
    identifier: &str,
    issuer: &IdentifierIssuer,
) -> Result<HashNDegreeQuadsOutput, Error> {
    let mut issuer = issuer.clone();
    // 1
    let mut hash_to_related_blank_nodes: Map<String, Vec<BlankNodeLabel>> = Map::new();
    // 2, 3
    if let Some(quads) = normalization_state
        .blank_node_to_quads
        .get(identifier)
        .cloned()
    {
        for quad in quads {
            for (component, position) in quad.blank_node_components_with_position() {
                if component.0 != identifier {
                    let hash = hash_related_blank_node(
                        normalization_state,
                        &component.0,
                        quad,
                        &issuer,
                        position,
                    );
                    hash_to_related_blank_nodes
                        .entry(hash)
                        .or_insert_with(Vec::new)
                        .push(component.clone());
                }
            }
        }
    }
    // 4
    let mut data_to_hash = String::new();
    // 5
    for (related_hash, blank_node_list) in hash_to_related_blank_nodes {
        data_to_hash.push_str(&related_hash);
        let mut chosen_path = String::new();
        let mut chosen_issuer = None;
        // 5.4
        'permutations: for permutation in combination::permutate::from_vec(&blank_node_list) {
            let mut issuer_copy = issuer.clone();
            let mut path = String::new();
            let mut recursion_list: Vec<String> = Vec::new();
            for related in permutation {
                if let Some(canonical_identifier) = normalization_state
                    .canonical_issuer
                    .find_issued_identifier(&related.0)
                {
                    path.push_str(canonical_identifier);
                } else {
                    if issuer_copy.find_issued_identifier(&related.0).is_none() {
                        recursion_list.push(related.0.clone());
                    }
                    path.push_str(&issuer_copy.issue(&related.0));
                }
                if !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
                {
                    continue 'permutations;
                }
            }
            for related in recursion_list {
                let result = hash_n_degree_quads(normalization_state, &related, &issuer_copy)?;
                path.push_str(&issuer_copy.issue(&related));
                path.push('<');
                path.push_str(&result.hash);
                path.push('>');
                issuer_copy = result.issuer;
                if !chosen_path.is_empty() && path.len() >= chosen_path.len() && path > chosen_path
                {
                    continue 'permutations;
                }
            }
            if chosen_path.is_empty() || path < chosen_path {
                chosen_path = path;
                chosen_issuer = Some(issuer_copy);
            }
        }
        data_to_hash.push_str(&chosen_path);
        issuer = chosen_issuer
            .ok_or_else(|| Error::Canonicalization("Missing chosen issuer".to_string()))?;
    }
    // 6
    Ok(HashNDegreeQuadsOutput {
        hash: digest_to_lowerhex(&sha256(data_to_hash.as_bytes())),
        issuer,
    })
}

/// <https://json-ld.github.io/normalization/spec/#hash-related-blank-node>
pub fn hash_related_blank_node(
    normalization_state: &NormalizationState,
    related: &str,
    quad: &Statement,
    issuer: &IdentifierIssuer,
    position: Position,
) -> String {
    let identifier = match normalization_state
        .canonical_issuer
        .find_issued_identifier(related)
        .or_else(|| issuer.find_issued_identifier(related))
    {
        Some(id) => id.to_string(),
        None => hash_first_degree_quads(normalization_state, related),
    };
    let mut input = match position {
        Position::Subject => "s",
        Position::Object => "o",
        Position::Graph => "g",
    }
    .to_string();
    if position != Position::Graph {
        let Predicate::IRIRef(ref predicate) = quad.predicate;
        input.push('<');
        input.push_str(&predicate.0);
        input.push('>');
    }
    input += &identifier;
    digest_to_lowerhex(&sha256(input.as_bytes()))
}
