//! Descriptor parsing (spec §6): the `urn:jboss:module:1.0` grammar.
//!
//! Descriptors only *reference* resource roots by name or path; opening
//! the backend behind a name (walking a directory, opening an archive) is
//! the caller's job, so `parse_descriptor` takes the already-opened
//! backends as `named_roots`.

use crate::backends::FilteredResourceLoader;
use crate::error::ModuleError;
use crate::filter::{PathFilter, PathFilterBuilder};
use crate::identifier::ModuleIdentifier;
use crate::resource::ResourceLoader;
use crate::spec::{DependencySpec, ModuleSpec, ModuleSpecBuilder};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::sync::Arc;

pub fn parse_descriptor(
    xml: &str,
    expected: &ModuleIdentifier,
    named_roots: &HashMap<String, Arc<dyn ResourceLoader>>,
) -> Result<ModuleSpec, ModuleError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text = true;

    let mut builder: Option<ModuleSpecBuilder> = None;
    let mut main_class: Option<String> = None;
    let mut dependencies: Vec<DependencySpec> = Vec::new();
    let mut roots: Vec<Arc<dyn ResourceLoader>> = Vec::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(tag) if tag.name().as_ref() == b"module" => {
                if builder.is_some() {
                    return Err(ModuleError::invalid_descriptor(
                        "<module>",
                        "duplicated <module> root element",
                    ));
                }
                let identifier = parse_module_identifier(&tag)?;
                if &identifier != expected {
                    return Err(ModuleError::invalid_descriptor(
                        "<module>",
                        format!("descriptor declares '{identifier}' but '{expected}' was requested"),
                    ));
                }
                builder = Some(ModuleSpec::builder(identifier));
            }
            Event::Start(tag) if tag.name().as_ref() == b"dependencies" => {
                dependencies = parse_dependencies(&mut reader)?;
            }
            Event::Start(tag) if tag.name().as_ref() == b"resources" => {
                roots = parse_resources(&mut reader, named_roots)?;
            }
            Event::Empty(tag) if tag.name().as_ref() == b"main-class" => {
                main_class = Some(required_attr(&tag, "name")?);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let mut builder = builder.ok_or_else(|| {
        ModuleError::invalid_descriptor("<module>", "missing root <module> element")
    })?;
    if let Some(main_class) = main_class {
        builder = builder.main_class(main_class);
    }
    for root in roots {
        builder = builder.add_resource_root(root);
    }
    for dependency in dependencies {
        builder = builder.add_dependency(dependency);
    }
    // spec §6: "implicitly append a local dependency ... after all explicit dependencies."
    builder = builder.add_dependency(DependencySpec::local());

    Ok(builder.build())
}

fn parse_module_identifier(tag: &BytesStart) -> Result<ModuleIdentifier, ModuleError> {
    let name = required_attr(tag, "name")?;
    name.parse()
        .map_err(|_| ModuleError::invalid_descriptor("<module>", format!("malformed identifier '{name}'")))
}

fn parse_dependencies(reader: &mut Reader<&[u8]>) -> Result<Vec<DependencySpec>, ModuleError> {
    let mut buf = Vec::new();
    let mut dependencies = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(tag) if tag.name().as_ref() == b"module" => {
                dependencies.push(parse_dependency_module(reader, &tag)?);
            }
            Event::Empty(tag) if tag.name().as_ref() == b"module" => {
                dependencies.push(build_dependency_spec(&tag, PathFilter::accept_all(), None)?);
            }
            Event::End(tag) if tag.name().as_ref() == b"dependencies" => break,
            Event::Eof => {
                return Err(ModuleError::invalid_descriptor(
                    "<dependencies>",
                    "unexpected end of document",
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(dependencies)
}

fn parse_dependency_module(
    reader: &mut Reader<&[u8]>,
    tag: &BytesStart,
) -> Result<DependencySpec, ModuleError> {
    let mut import_filter = PathFilter::accept_all();
    let mut export_filter: Option<PathFilter> = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(child) if child.name().as_ref() == b"imports" => {
                import_filter = parse_filter_rules(reader, b"imports")?;
            }
            Event::Start(child) if child.name().as_ref() == b"exports" => {
                export_filter = Some(parse_filter_rules(reader, b"exports")?);
            }
            Event::End(end) if end.name().as_ref() == b"module" => break,
            Event::Eof => {
                return Err(ModuleError::invalid_descriptor("<module>", "unexpected end of document"))
            }
            _ => {}
        }
        buf.clear();
    }
    build_dependency_spec(tag, import_filter, export_filter)
}

/// `export_filter` is `None` when no nested `<exports>` element was
/// present, in which case the `export="bool"` shorthand attribute decides
/// (spec §6).
fn build_dependency_spec(
    tag: &BytesStart,
    import_filter: PathFilter,
    export_filter: Option<PathFilter>,
) -> Result<DependencySpec, ModuleError> {
    let name = required_attr(tag, "name")?;
    let parsed: ModuleIdentifier = name
        .parse()
        .map_err(|_| ModuleError::invalid_descriptor("<module>", format!("malformed dependency identifier '{name}'")))?;
    let slot = optional_attr(tag, "slot")?.or_else(|| parsed.slot().map(str::to_string));
    let identifier = ModuleIdentifier::new(parsed.group().to_string(), parsed.artifact().to_string(), slot)
        .map_err(|e| ModuleError::invalid_descriptor("<module>", e.to_string()))?;

    let exported_by_default = bool_attr(tag, "export", false)?;
    let optional = bool_attr(tag, "optional", false)?;

    let export_filter = export_filter.unwrap_or(if exported_by_default {
        PathFilter::accept_all()
    } else {
        PathFilter::reject_all()
    });

    let mut spec = DependencySpec::module(identifier)
        .with_import_filter(import_filter)
        .with_export_filter(export_filter);
    if optional {
        spec = spec.optional();
    }
    Ok(spec)
}

fn parse_filter_rules(reader: &mut Reader<&[u8]>, end_tag: &[u8]) -> Result<PathFilter, ModuleError> {
    // spec §6: "<include>"/"<exclude>" rules "populate a multiple filter
    // with defaultAccept=true".
    let mut builder = PathFilterBuilder::new(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Empty(tag) if tag.name().as_ref() == b"include" => {
                builder = builder.include_path(required_attr(&tag, "path")?);
            }
            Event::Empty(tag) if tag.name().as_ref() == b"exclude" => {
                builder = builder.exclude_path(required_attr(&tag, "path")?);
            }
            Event::End(tag) if tag.name().as_ref() == end_tag => break,
            Event::Eof => {
                return Err(ModuleError::invalid_descriptor(
                    "<imports>/<exports>",
                    "unexpected end of document",
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(builder.build())
}

fn parse_resources(
    reader: &mut Reader<&[u8]>,
    named_roots: &HashMap<String, Arc<dyn ResourceLoader>>,
) -> Result<Vec<Arc<dyn ResourceLoader>>, ModuleError> {
    let mut buf = Vec::new();
    let mut roots = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(tag) if tag.name().as_ref() == b"resource-root" => {
                roots.push(parse_resource_root(reader, &tag, named_roots)?);
            }
            Event::Empty(tag) if tag.name().as_ref() == b"resource-root" => {
                roots.push(lookup_root(&tag, named_roots)?);
            }
            Event::End(tag) if tag.name().as_ref() == b"resources" => break,
            Event::Eof => {
                return Err(ModuleError::invalid_descriptor("<resources>", "unexpected end of document"))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(roots)
}

fn parse_resource_root(
    reader: &mut Reader<&[u8]>,
    tag: &BytesStart,
    named_roots: &HashMap<String, Arc<dyn ResourceLoader>>,
) -> Result<Arc<dyn ResourceLoader>, ModuleError> {
    let base = lookup_root(tag, named_roots)?;
    let mut export_filter = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(child) if child.name().as_ref() == b"exports" => {
                export_filter = Some(parse_filter_rules(reader, b"exports")?);
            }
            Event::End(end) if end.name().as_ref() == b"resource-root" => break,
            Event::Eof => {
                return Err(ModuleError::invalid_descriptor(
                    "<resource-root>",
                    "unexpected end of document",
                ))
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(match export_filter {
        Some(filter) => Arc::new(FilteredResourceLoader::new(base, filter)),
        None => base,
    })
}

fn lookup_root(
    tag: &BytesStart,
    named_roots: &HashMap<String, Arc<dyn ResourceLoader>>,
) -> Result<Arc<dyn ResourceLoader>, ModuleError> {
    let path = required_attr(tag, "path")?;
    let key = optional_attr(tag, "name")?.unwrap_or_else(|| path.clone());
    named_roots.get(&key).cloned().ok_or_else(|| {
        ModuleError::invalid_descriptor(
            "<resource-root>",
            format!("no backend supplied for resource root '{key}'"),
        )
    })
}

fn bool_attr(tag: &BytesStart, name: &str, default: bool) -> Result<bool, ModuleError> {
    match optional_attr(tag, name)? {
        None => Ok(default),
        Some(value) if value == "true" => Ok(true),
        Some(value) if value == "false" => Ok(false),
        Some(value) => Err(ModuleError::invalid_descriptor(
            tag_name(tag),
            format!("attribute '{name}' must be 'true' or 'false', got '{value}'"),
        )),
    }
}

fn required_attr(tag: &BytesStart, name: &str) -> Result<String, ModuleError> {
    optional_attr(tag, name)?.ok_or_else(|| {
        ModuleError::invalid_descriptor(tag_name(tag), format!("missing required attribute '{name}'"))
    })
}

fn optional_attr(tag: &BytesStart, name: &str) -> Result<Option<String>, ModuleError> {
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| ModuleError::Xml(e.to_string()))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| ModuleError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn tag_name(tag: &BytesStart) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).into_owned()
}

fn xml_err(err: quick_xml::Error) -> ModuleError {
    ModuleError::Xml(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ModuleIdentifier {
        s.parse().unwrap()
    }

    #[test]
    fn parses_minimal_module() {
        let xml = r#"<module xmlns="urn:jboss:module:1.0" name="org.acme:widgets"/>"#;
        let spec = parse_descriptor(xml, &id("org.acme:widgets"), &HashMap::new()).unwrap();
        assert_eq!(spec.identifier, id("org.acme:widgets"));
        // implicit local dependency is always appended.
        assert_eq!(spec.dependencies.len(), 1);
        assert!(matches!(spec.dependencies[0], DependencySpec::Local { .. }));
    }

    #[test]
    fn rejects_identifier_mismatch() {
        let xml = r#"<module xmlns="urn:jboss:module:1.0" name="org.acme:widgets"/>"#;
        let err = parse_descriptor(xml, &id("org.acme:gadgets"), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidDescriptor { .. }));
    }

    #[test]
    fn rejects_missing_name_attribute() {
        let xml = r#"<module xmlns="urn:jboss:module:1.0"/>"#;
        assert!(parse_descriptor(xml, &id("org.acme:widgets"), &HashMap::new()).is_err());
    }

    #[test]
    fn rejects_duplicated_module_root() {
        let xml = r#"
            <module xmlns="urn:jboss:module:1.0" name="org.acme:widgets"/>
            <module xmlns="urn:jboss:module:1.0" name="org.acme:widgets"/>
        "#;
        assert!(parse_descriptor(xml, &id("org.acme:widgets"), &HashMap::new()).is_err());
    }

    #[test]
    fn parses_dependency_with_filters_and_main_class() {
        let xml = r#"
            <module xmlns="urn:jboss:module:1.0" name="org.acme:widgets">
                <dependencies>
                    <module name="org.acme:base" export="true" optional="true">
                        <imports>
                            <exclude path="nested"/>
                        </imports>
                    </module>
                </dependencies>
                <main-class name="org.acme.widgets.Main"/>
            </module>
        "#;
        let spec = parse_descriptor(xml, &id("org.acme:widgets"), &HashMap::new()).unwrap();
        assert_eq!(spec.main_class.as_deref(), Some("org.acme.widgets.Main"));
        assert_eq!(spec.dependencies.len(), 2);
        match &spec.dependencies[0] {
            DependencySpec::Module {
                identifier,
                optional,
                import_filter,
                export_filter,
                ..
            } => {
                assert_eq!(*identifier, id("org.acme:base"));
                assert!(*optional);
                assert!(!import_filter.matches("nested"));
                assert!(export_filter.matches("anything"));
            }
            other => panic!("expected a module dependency, got a different variant: {other:?}"),
        }
    }
}
