//! Minimal structural XML Schema validation
//!
//! Compiles the declarations an XSD document carries (top-level element
//! declarations and the required-child rules of named complex types) and
//! checks instance documents against them. This is the conformance signal
//! the monitoring report surfaces, not a general XSD 1.0 processor:
//! facets, identity constraints, and cross-document includes are out.
//!
//! The compiled [`Schema`] is read-only and shared across all concurrent
//! validation tasks.

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::collections::HashMap;

use crate::error::{FailureKind, SchemaError};

/// XML Schema definition namespace
const XSD_NS: &[u8] = b"http://www.w3.org/2001/XMLSchema";

/// A violation found while validating an instance document
///
/// This is data, not a fault: an invalid record is an expected outcome
/// surfaced in the report, never something that halts processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    message: String,
}

impl SchemaViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable description of the violation
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> FailureKind {
        FailureKind::SchemaInvalid
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// A compiled, shareable schema
#[derive(Debug, Clone)]
pub struct Schema {
    /// Target namespace of the schema document
    target_namespace: Option<String>,

    /// Top-level element declarations: local name -> type local name
    elements: HashMap<String, Option<String>>,

    /// Named complex types: local name -> required child local names
    types: HashMap<String, Vec<String>>,
}

impl Schema {
    /// Compile a schema from XSD source text
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if the schema document itself is not
    /// well-formed XML.
    pub fn compile(xsd: &str) -> Result<Self, SchemaError> {
        let mut reader = NsReader::from_str(xsd);
        let mut depth = 0usize;
        let mut target_namespace = None;
        let mut elements = HashMap::new();
        let mut types: HashMap<String, Vec<String>> = HashMap::new();
        // Name of the named complexType currently open, if any.
        let mut current_type: Option<(String, Vec<String>)> = None;

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let was_start = matches!(event, Event::Start(_));
                    let local = e.local_name();
                    let xsd_local = xsd_element(&ns, local.as_ref());

                    match xsd_local {
                        Some(b"schema") if depth == 0 => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"targetNamespace" {
                                    target_namespace =
                                        Some(String::from_utf8_lossy(&attr.value).into_owned());
                                }
                            }
                        }
                        Some(b"element") if depth == 1 => {
                            if let Some(name) = attribute(e, b"name") {
                                let type_name = attribute(e, b"type").map(strip_prefix);
                                elements.insert(name, type_name);
                            }
                        }
                        Some(b"complexType") if depth == 1 => {
                            if let Some(name) = attribute(e, b"name") {
                                current_type = Some((name, Vec::new()));
                            }
                        }
                        Some(b"element") if depth > 1 => {
                            if let Some((_, required)) = current_type.as_mut() {
                                let min_occurs =
                                    attribute(e, b"minOccurs").unwrap_or_else(|| "1".into());
                                if min_occurs != "0" {
                                    let child = attribute(e, b"name")
                                        .or_else(|| attribute(e, b"ref").map(strip_prefix));
                                    if let Some(child) = child {
                                        required.push(child);
                                    }
                                }
                            }
                        }
                        _ => {}
                    }

                    if was_start {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        if let Some((name, required)) = current_type.take() {
                            types.insert(name, required);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self {
            target_namespace,
            elements,
            types,
        })
    }

    /// Whether the schema carries no usable declarations
    ///
    /// Aggregation schemas that consist purely of includes compile to an
    /// empty declaration set; validation against them is vacuous. Callers
    /// resolve the include chain with [`schema_locations`] and [`merge`]
    /// before validating, and skip validation when the result is still
    /// vacuous.
    ///
    /// [`merge`]: Schema::merge
    pub fn is_vacuous(&self) -> bool {
        self.elements.is_empty()
    }

    /// Fold another compiled document's declarations into this schema
    ///
    /// Used while resolving an include/import chain. The root document's
    /// target namespace wins; a root without one adopts the first merged
    /// document's.
    pub fn merge(&mut self, other: Schema) {
        if self.target_namespace.is_none() {
            self.target_namespace = other.target_namespace;
        }
        self.elements.extend(other.elements);
        self.types.extend(other.types);
    }

    /// Validate an instance document
    ///
    /// Checks that the root element is declared by the schema, sits in the
    /// target namespace, and carries every required child its type names.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaViolation`] found.
    pub fn validate(&self, document: &str) -> Result<(), SchemaViolation> {
        if self.is_vacuous() {
            return Ok(());
        }

        let mut reader = NsReader::from_str(document);
        let mut root: Option<String> = None;
        let mut depth = 0usize;
        let mut children: Vec<String> = Vec::new();

        loop {
            let (ns, event) = reader
                .read_resolved_event()
                .map_err(|e| SchemaViolation::new(format!("document is not well-formed: {e}")))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    if depth == 0 {
                        self.check_root_namespace(&ns, &local)?;
                        root = Some(local);
                    } else if depth == 1 {
                        children.push(local);
                    }
                    if matches!(event, Event::Start(_)) {
                        depth += 1;
                    }
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                Event::Eof => break,
                _ => {}
            }
        }

        let root = root
            .ok_or_else(|| SchemaViolation::new("document has no root element".to_string()))?;

        let type_name = match self.elements.get(&root) {
            Some(declared) => declared,
            None => {
                return Err(SchemaViolation::new(format!(
                    "no declaration found for element '{root}'"
                )))
            }
        };

        if let Some(type_name) = type_name {
            if let Some(required) = self.types.get(type_name) {
                for child in required {
                    if !children.iter().any(|c| c == child) {
                        return Err(SchemaViolation::new(format!(
                            "element '{root}' is missing required child '{child}'"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    fn check_root_namespace(
        &self,
        ns: &ResolveResult<'_>,
        local: &str,
    ) -> Result<(), SchemaViolation> {
        if let Some(expected) = &self.target_namespace {
            let actual = match ns {
                ResolveResult::Bound(namespace) => {
                    Some(String::from_utf8_lossy(namespace.as_ref()).into_owned())
                }
                _ => None,
            };
            if actual.as_deref() != Some(expected.as_str()) {
                return Err(SchemaViolation::new(format!(
                    "element '{local}' is not in target namespace '{expected}'"
                )));
            }
        }
        Ok(())
    }
}

/// Schema locations referenced by top-level `xs:include` and `xs:import`
///
/// Returned in document order, raw as written; callers resolve relative
/// locations against the referring document's URL.
///
/// # Errors
///
/// Returns [`SchemaError`] if the schema document is not well-formed XML.
pub fn schema_locations(xsd: &str) -> Result<Vec<String>, SchemaError> {
    let mut reader = NsReader::from_str(xsd);
    let mut depth = 0usize;
    let mut locations = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 1 {
                    let local = e.local_name();
                    if matches!(
                        xsd_element(&ns, local.as_ref()),
                        Some(b"include") | Some(b"import")
                    ) {
                        if let Some(location) = attribute(e, b"schemaLocation") {
                            locations.push(location);
                        }
                    }
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(locations)
}

/// Resolve an element to its XSD-namespace local name, if it is one
fn xsd_element<'a>(ns: &ResolveResult<'_>, local: &'a [u8]) -> Option<&'a [u8]> {
    match ns {
        ResolveResult::Bound(namespace) if namespace.as_ref() == XSD_NS => Some(local),
        _ => None,
    }
}

/// Read an attribute value as a string
fn attribute(element: &quick_xml::events::BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Drop a `prefix:` qualifier from a QName string
fn strip_prefix(qname: String) -> String {
    match qname.split_once(':') {
        Some((_, local)) => local.to_string(),
        None => qname,
    }
}
