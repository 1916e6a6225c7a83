use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{info, warn};

use crate::interaction::Verb;
use crate::sprite_keys::validate_sprite_key;
use crate::world::{
    Door, DoorState, Entity, EntityId, EntityIdAllocator, EntityKind, EntityState, Key,
    KeyLocation, NotFound, Rect, Scene, SceneManager, ScriptedRefusal, Table, Vec2,
};

use super::default_scene::default_script;
use super::hashing::fingerprint_script;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownKind,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateId,
    UndefinedReference,
    WrongReferenceKind,
    ConcealCycle,
    ConflictingState,
    EmptyScene,
}

/// Structural failure while loading a script.
#[derive(Debug, Clone)]
pub struct MalformedScript {
    pub code: ScriptErrorCode,
    pub message: String,
    pub field: Option<String>,
    pub file_path: Option<PathBuf>,
    pub location: Option<SourceLocation>,
}

impl MalformedScript {
    fn with_file_path(mut self, path: &Path) -> Self {
        self.file_path = Some(path.to_path_buf());
        self
    }
}

impl fmt::Display for MalformedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field={field})")?;
        }
        if let Some(path) = &self.file_path {
            write!(f, " (file={})", path.display())?;
        }
        if let Some(loc) = self.location {
            write!(f, " (line={}, column={})", loc.line, loc.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for MalformedScript {}

/// Scenes built from one script, fully linked.
#[derive(Debug, Clone)]
pub struct LoadedScript {
    pub scenes: Vec<Scene>,
    pub start_scene: String,
    /// SHA-256 of the script text, used to match saves to their script.
    pub fingerprint: String,
    pub is_default: bool,
}

impl LoadedScript {
    pub fn entity_count(&self) -> usize {
        self.scenes.iter().map(Scene::entity_count).sum()
    }

    pub fn into_scene_manager(self) -> Result<SceneManager, NotFound> {
        SceneManager::new(self.scenes, &self.start_scene)
    }
}

#[derive(Debug, Clone)]
struct Declared {
    scene_id: String,
}

#[derive(Debug, Clone)]
struct Reference {
    target: String,
    field: &'static str,
    location: SourceLocation,
}

#[derive(Debug, Clone)]
struct PendingProperties {
    location: SourceLocation,
    position: Option<Vec2>,
    size: Option<Vec2>,
    hidden: bool,
    interactive: bool,
    sprite: Option<String>,
    open: bool,
    locked: bool,
    key_required: Option<Reference>,
    leads_to: Option<Reference>,
    items_on_top: Vec<Reference>,
    conceals: Vec<Reference>,
    refusals: Vec<ScriptedRefusal>,
}

impl PendingProperties {
    fn new(location: SourceLocation) -> Self {
        Self {
            location,
            position: None,
            size: None,
            hidden: false,
            interactive: true,
            sprite: None,
            open: false,
            locked: false,
            key_required: None,
            leads_to: None,
            items_on_top: Vec::new(),
            conceals: Vec::new(),
            refusals: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingEntity {
    id: EntityId,
    name: String,
    kind: EntityKind,
    label: String,
    location: SourceLocation,
    properties: Option<PendingProperties>,
}

#[derive(Debug, Clone)]
struct PendingScene {
    id: String,
    title: String,
    description: String,
    location: SourceLocation,
    entities: Vec<PendingEntity>,
}

impl PendingScene {
    fn entity(&self, name: &str) -> Option<&PendingEntity> {
        self.entities.iter().find(|entity| entity.name == name)
    }
}

pub fn load_script_file(path: &Path) -> Result<LoadedScript, MalformedScript> {
    let raw = fs::read_to_string(path).map_err(|source| MalformedScript {
        code: ScriptErrorCode::ReadFile,
        message: format!("failed to read script: {source}"),
        field: None,
        file_path: Some(path.to_path_buf()),
        location: None,
    })?;
    parse_script(&raw).map_err(|error| error.with_file_path(path))
}

/// Loads the script at `path`, falling back to the built-in default scene
/// when no path is given, the file is absent, or the script is malformed.
pub fn load_or_default(path: Option<&Path>) -> LoadedScript {
    let Some(path) = path else {
        info!("no_script_configured_using_default");
        return default_script();
    };
    if !path.exists() {
        warn!(path = %path.display(), "script_missing_using_default");
        return default_script();
    }

    match load_script_file(path) {
        Ok(script) => {
            info!(
                path = %path.display(),
                scene_count = script.scenes.len(),
                entity_count = script.entity_count(),
                start_scene = %script.start_scene,
                "script_loaded"
            );
            script
        }
        Err(error) => {
            warn!(error = %error, "script_load_failed_using_default");
            default_script()
        }
    }
}

/// Parses script text. Blank input yields the default scene.
pub fn parse_script(raw: &str) -> Result<LoadedScript, MalformedScript> {
    if raw.trim().is_empty() {
        info!("script_empty_using_default");
        return Ok(default_script());
    }

    let doc = Document::parse(raw).map_err(|error| MalformedScript {
        code: ScriptErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        field: None,
        file_path: None,
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Script" {
        return Err(error_at_node(
            ScriptErrorCode::InvalidRoot,
            "root element must be <Script>".to_string(),
            None,
            &doc,
            root,
        ));
    }

    let mut allocator = EntityIdAllocator::default();
    let mut declared = HashMap::<String, Declared>::new();
    let mut pending_scenes = Vec::<PendingScene>::new();

    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "Scene" {
            return Err(error_at_node(
                ScriptErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}>; <Script> may only contain <Scene>",
                    child.tag_name().name()
                ),
                None,
                &doc,
                child,
            ));
        }
        let scene = parse_scene(&doc, child, &mut allocator, &mut declared)?;
        if pending_scenes.iter().any(|existing| existing.id == scene.id) {
            return Err(error_at_node(
                ScriptErrorCode::DuplicateId,
                format!("duplicate scene id '{}'", scene.id),
                Some("id"),
                &doc,
                child,
            ));
        }
        pending_scenes.push(scene);
    }

    let Some(first_scene) = pending_scenes.first() else {
        return Err(error_at_node(
            ScriptErrorCode::MissingField,
            "<Script> must contain at least one <Scene>".to_string(),
            None,
            &doc,
            root,
        ));
    };

    let start_scene = match root.attribute("start") {
        Some(start) => {
            if !pending_scenes.iter().any(|scene| scene.id == start) {
                return Err(error_at_node(
                    ScriptErrorCode::UndefinedReference,
                    format!("start scene '{start}' is not declared"),
                    Some("start"),
                    &doc,
                    root,
                ));
            }
            start.to_string()
        }
        None => first_scene.id.clone(),
    };

    let scene_ids = pending_scenes
        .iter()
        .map(|scene| scene.id.as_str())
        .collect::<HashSet<_>>();
    let scenes = pending_scenes
        .iter()
        .map(|scene| link_scene(scene, &declared, &scene_ids))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LoadedScript {
        scenes,
        start_scene,
        fingerprint: fingerprint_script(raw),
        is_default: false,
    })
}

fn parse_scene(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    allocator: &mut EntityIdAllocator,
    declared: &mut HashMap<String, Declared>,
) -> Result<PendingScene, MalformedScript> {
    let id = required_attribute(doc, node, "id", "Scene")?;
    let title = node
        .attribute("title")
        .map(str::to_string)
        .unwrap_or_else(|| format!("scene.{id}.title"));
    let description = node
        .attribute("description")
        .map(str::to_string)
        .unwrap_or_else(|| format!("scene.{id}.description"));

    let mut manifest: Option<Node<'_, '_>> = None;
    let mut properties: Option<Node<'_, '_>> = None;
    for child in node.children().filter(|child| child.is_element()) {
        let slot = match child.tag_name().name() {
            "entities" => &mut manifest,
            "object_properties" => &mut properties,
            other => {
                return Err(error_at_node(
                    ScriptErrorCode::UnknownElement,
                    format!(
                        "unsupported element <{other}> in <Scene>; expected <entities> or <object_properties>"
                    ),
                    None,
                    doc,
                    child,
                ))
            }
        };
        if slot.is_some() {
            return Err(error_at_node(
                ScriptErrorCode::DuplicateField,
                format!("duplicate <{}> block in scene '{id}'", child.tag_name().name()),
                Some(child.tag_name().name()),
                doc,
                child,
            ));
        }
        *slot = Some(child);
    }

    let mut scene = PendingScene {
        id: id.clone(),
        title,
        description,
        location: location_of(doc, node),
        entities: Vec::new(),
    };

    if let Some(manifest) = manifest {
        for entry in manifest.children().filter(|child| child.is_element()) {
            let entity = parse_manifest_entry(doc, entry, allocator)?;
            if let Some(previous) = declared.get(&entity.name) {
                return Err(error_at_node(
                    ScriptErrorCode::DuplicateId,
                    format!(
                        "duplicate entity id '{}' (already declared in scene '{}')",
                        entity.name, previous.scene_id
                    ),
                    Some("id"),
                    doc,
                    entry,
                ));
            }
            declared.insert(
                entity.name.clone(),
                Declared {
                    scene_id: id.clone(),
                },
            );
            scene.entities.push(entity);
        }
    }

    if let Some(properties) = properties {
        for object in properties.children().filter(|child| child.is_element()) {
            parse_object_properties(doc, object, &mut scene)?;
        }
    }

    Ok(scene)
}

fn parse_manifest_entry(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    allocator: &mut EntityIdAllocator,
) -> Result<PendingEntity, MalformedScript> {
    if node.tag_name().name() != "Entity" {
        return Err(error_at_node(
            ScriptErrorCode::UnknownElement,
            format!(
                "unsupported element <{}> in <entities>; expected <Entity>",
                node.tag_name().name()
            ),
            None,
            doc,
            node,
        ));
    }

    let name = required_attribute(doc, node, "id", "Entity")?;
    let kind_raw = required_attribute(doc, node, "kind", "Entity")?;
    let Some(kind) = EntityKind::from_script_name(&kind_raw) else {
        let allowed = EntityKind::ALL
            .iter()
            .map(|kind| kind.script_name())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(error_at_node(
            ScriptErrorCode::UnknownKind,
            format!("unknown entity kind '{kind_raw}'; allowed values: {allowed}"),
            Some("kind"),
            doc,
            node,
        ));
    };
    let label = node
        .attribute("name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("object.{}", kind.as_token()));

    Ok(PendingEntity {
        id: allocator.allocate(),
        name,
        kind,
        label,
        location: location_of(doc, node),
        properties: None,
    })
}

fn parse_object_properties(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    scene: &mut PendingScene,
) -> Result<(), MalformedScript> {
    if node.tag_name().name() != "Object" {
        return Err(error_at_node(
            ScriptErrorCode::UnknownElement,
            format!(
                "unsupported element <{}> in <object_properties>; expected <Object>",
                node.tag_name().name()
            ),
            None,
            doc,
            node,
        ));
    }

    let target = required_attribute(doc, node, "ref", "Object")?;
    let scene_id = scene.id.clone();
    let Some(entity) = scene
        .entities
        .iter_mut()
        .find(|entity| entity.name == target)
    else {
        return Err(error_at_node(
            ScriptErrorCode::UndefinedReference,
            format!("<Object ref=\"{target}\"> does not match any entity declared in scene '{scene_id}'"),
            Some("ref"),
            doc,
            node,
        ));
    };
    if entity.properties.is_some() {
        return Err(error_at_node(
            ScriptErrorCode::DuplicateField,
            format!("entity '{target}' has more than one <Object> block"),
            Some("ref"),
            doc,
            node,
        ));
    }

    let kind = entity.kind;
    let mut properties = PendingProperties::new(location_of(doc, node));
    let mut seen_fields = HashSet::<String>::new();

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(error_at_node(
                ScriptErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> for '{target}'"),
                Some(&field_name),
                doc,
                field,
            ));
        }

        match (field_name.as_str(), kind) {
            ("position", _) => {
                properties.position = Some(parse_vec2(doc, field, "position", false)?);
            }
            ("size", _) => {
                properties.size = Some(parse_vec2(doc, field, "size", true)?);
            }
            ("hidden", _) => properties.hidden = parse_bool(doc, field, "hidden")?,
            ("interactive", _) => properties.interactive = parse_bool(doc, field, "interactive")?,
            ("sprite", _) => {
                let value = required_text(doc, field, "sprite")?;
                if let Err(error) = validate_sprite_key(&value) {
                    return Err(error_at_node(
                        ScriptErrorCode::InvalidValue,
                        format!("invalid sprite key '{value}': {error}"),
                        Some("sprite"),
                        doc,
                        field,
                    ));
                }
                properties.sprite = Some(value);
            }
            ("responses", _) => properties.refusals = parse_responses(doc, field)?,
            ("open", EntityKind::Door) => properties.open = parse_bool(doc, field, "open")?,
            ("locked", EntityKind::Door) => properties.locked = parse_bool(doc, field, "locked")?,
            ("key_required", EntityKind::Door) => {
                properties.key_required = Some(parse_single_reference(doc, field, "key_required")?);
            }
            ("leads_to", EntityKind::Door) => {
                properties.leads_to = Some(parse_single_reference(doc, field, "leads_to")?);
            }
            ("items_on_top", EntityKind::Table) => {
                properties.items_on_top = parse_reference_list(doc, field, "items_on_top");
            }
            ("conceals", EntityKind::Table) => {
                properties.conceals = parse_reference_list(doc, field, "conceals");
            }
            _ => {
                return Err(error_at_node(
                    ScriptErrorCode::UnknownField,
                    format!(
                        "unknown field <{field_name}> for {} '{target}'",
                        kind.script_name()
                    ),
                    Some(&field_name),
                    doc,
                    field,
                ))
            }
        }
    }

    entity.properties = Some(properties);
    Ok(())
}

fn link_scene(
    pending: &PendingScene,
    declared: &HashMap<String, Declared>,
    scene_ids: &HashSet<&str>,
) -> Result<Scene, MalformedScript> {
    if pending.entities.is_empty() {
        return Err(error_at(
            ScriptErrorCode::EmptyScene,
            format!("scene '{}' declares no entities", pending.id),
            Some("entities"),
            pending.location,
        ));
    }

    let concealed_by = check_concealment(pending, declared)?;

    let mut scene = Scene::new(
        pending.id.clone(),
        pending.title.clone(),
        pending.description.clone(),
    );

    for entity in &pending.entities {
        let Some(properties) = &entity.properties else {
            return Err(error_at(
                ScriptErrorCode::MissingField,
                format!(
                    "entity '{}' has no <Object> block in <object_properties>",
                    entity.name
                ),
                Some("position"),
                entity.location,
            ));
        };
        let Some(position) = properties.position else {
            return Err(error_at(
                ScriptErrorCode::MissingField,
                format!("missing required field <position> for '{}'", entity.name),
                Some("position"),
                properties.location,
            ));
        };

        let state = match entity.kind {
            EntityKind::Door => EntityState::Door(link_door(pending, declared, scene_ids, entity, properties)?),
            EntityKind::Key => EntityState::Key(Key {
                location: KeyLocation::OnGround,
            }),
            EntityKind::Table => EntityState::Table(link_table(pending, declared, entity, properties)?),
        };

        let size = properties.size.unwrap_or_else(|| entity.kind.default_size());
        let visible = !properties.hidden && !concealed_by.contains_key(entity.name.as_str());
        scene.place(
            Entity::new(
                entity.id,
                entity.name.clone(),
                entity.label.clone(),
                Rect::centered(position, size),
                state,
            )
            .with_sprite(properties.sprite.clone())
            .with_refusals(properties.refusals.clone())
            .with_flags(visible, properties.interactive),
        );
    }

    Ok(scene)
}

fn link_door(
    pending: &PendingScene,
    declared: &HashMap<String, Declared>,
    scene_ids: &HashSet<&str>,
    entity: &PendingEntity,
    properties: &PendingProperties,
) -> Result<Door, MalformedScript> {
    if properties.open && properties.locked {
        return Err(error_at(
            ScriptErrorCode::ConflictingState,
            format!("door '{}' cannot be both open and locked", entity.name),
            Some("locked"),
            properties.location,
        ));
    }

    if properties.locked && properties.key_required.is_none() {
        return Err(error_at(
            ScriptErrorCode::MissingField,
            format!("locked door '{}' needs <key_required>", entity.name),
            Some("key_required"),
            properties.location,
        ));
    }

    let key_required = properties
        .key_required
        .as_ref()
        .map(|reference| resolve_reference(pending, declared, reference, Some(EntityKind::Key)))
        .transpose()?;

    if let Some(leads_to) = &properties.leads_to {
        if !scene_ids.contains(leads_to.target.as_str()) {
            return Err(error_at(
                ScriptErrorCode::UndefinedReference,
                format!(
                    "door '{}' leads to undeclared scene '{}'",
                    entity.name, leads_to.target
                ),
                Some(leads_to.field),
                leads_to.location,
            ));
        }
    }

    let state = if properties.open {
        DoorState::Open
    } else if properties.locked {
        DoorState::Locked
    } else {
        DoorState::Closed
    };

    Ok(Door {
        state,
        key_required,
        leads_to: properties
            .leads_to
            .as_ref()
            .map(|reference| reference.target.clone()),
    })
}

fn link_table(
    pending: &PendingScene,
    declared: &HashMap<String, Declared>,
    entity: &PendingEntity,
    properties: &PendingProperties,
) -> Result<Table, MalformedScript> {
    let mut items_on_top = Vec::with_capacity(properties.items_on_top.len());
    for reference in &properties.items_on_top {
        if reference.target == entity.name {
            return Err(error_at(
                ScriptErrorCode::InvalidValue,
                format!("table '{}' cannot rest on itself", entity.name),
                Some(reference.field),
                reference.location,
            ));
        }
        let id = resolve_reference(pending, declared, reference, None)?;
        if items_on_top.contains(&id) {
            return Err(duplicate_list_entry(reference));
        }
        items_on_top.push(id);
    }

    let mut concealed = Vec::with_capacity(properties.conceals.len());
    for reference in &properties.conceals {
        let id = resolve_reference(pending, declared, reference, None)?;
        if concealed.contains(&id) {
            return Err(duplicate_list_entry(reference));
        }
        concealed.push(id);
    }

    Ok(Table {
        displaced: false,
        items_on_top,
        concealed,
    })
}

fn duplicate_list_entry(reference: &Reference) -> MalformedScript {
    error_at(
        ScriptErrorCode::InvalidValue,
        format!("'{}' is listed more than once", reference.target),
        Some(reference.field),
        reference.location,
    )
}

fn resolve_reference(
    pending: &PendingScene,
    declared: &HashMap<String, Declared>,
    reference: &Reference,
    expected_kind: Option<EntityKind>,
) -> Result<EntityId, MalformedScript> {
    let Some(target) = pending.entity(&reference.target) else {
        let message = match declared.get(&reference.target) {
            Some(elsewhere) => format!(
                "'{}' is declared in scene '{}'; references must stay within scene '{}'",
                reference.target, elsewhere.scene_id, pending.id
            ),
            None => format!("reference to undefined entity '{}'", reference.target),
        };
        return Err(error_at(
            ScriptErrorCode::UndefinedReference,
            message,
            Some(reference.field),
            reference.location,
        ));
    };

    if let Some(expected) = expected_kind {
        if target.kind != expected {
            return Err(error_at(
                ScriptErrorCode::WrongReferenceKind,
                format!(
                    "'{}' is a {}, expected a {}",
                    reference.target,
                    target.kind.script_name(),
                    expected.script_name()
                ),
                Some(reference.field),
                reference.location,
            ));
        }
    }

    Ok(target.id)
}

/// Validates the conceals graph of one scene and returns, for each concealed
/// entity name, the table that hides it.
fn check_concealment<'a>(
    pending: &'a PendingScene,
    declared: &HashMap<String, Declared>,
) -> Result<HashMap<&'a str, &'a str>, MalformedScript> {
    let mut concealed_by = HashMap::<&str, &str>::new();
    let mut edges = HashMap::<&str, Vec<&Reference>>::new();

    for entity in &pending.entities {
        let Some(properties) = &entity.properties else {
            continue;
        };
        for reference in &properties.conceals {
            resolve_reference(pending, declared, reference, None)?;
            if let Some(previous) = concealed_by.insert(reference.target.as_str(), entity.name.as_str()) {
                if previous != entity.name {
                    return Err(error_at(
                        ScriptErrorCode::InvalidValue,
                        format!(
                            "'{}' is concealed by both '{}' and '{}'",
                            reference.target, previous, entity.name
                        ),
                        Some(reference.field),
                        reference.location,
                    ));
                }
            }
            edges
                .entry(entity.name.as_str())
                .or_default()
                .push(reference);
        }
    }

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a Reference>>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<(), MalformedScript> {
        marks.insert(node, Mark::Visiting);
        for reference in edges.get(node).into_iter().flatten() {
            let next = reference.target.as_str();
            match marks.get(next) {
                Some(Mark::Visiting) => {
                    return Err(error_at(
                        ScriptErrorCode::ConcealCycle,
                        format!("'{node}' conceals '{next}', which closes a concealment cycle"),
                        Some(reference.field),
                        reference.location,
                    ))
                }
                Some(Mark::Done) => {}
                None => visit(next, edges, marks)?,
            }
        }
        marks.insert(node, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::<&str, Mark>::new();
    for entity in &pending.entities {
        if !marks.contains_key(entity.name.as_str()) {
            visit(entity.name.as_str(), &edges, &mut marks)?;
        }
    }

    Ok(concealed_by)
}

fn required_attribute(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    attribute: &str,
    element: &str,
) -> Result<String, MalformedScript> {
    let value = node.attribute(attribute).map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(error_at_node(
            ScriptErrorCode::MissingField,
            format!("missing required attribute '{attribute}' on <{element}>"),
            Some(attribute),
            doc,
            node,
        ));
    }
    Ok(value.to_string())
}

fn required_text(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, MalformedScript> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(error_at_node(
            ScriptErrorCode::MissingField,
            format!("field <{field_name}> must not be empty"),
            Some(field_name),
            doc,
            node,
        ));
    }
    Ok(value)
}

fn parse_bool(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<bool, MalformedScript> {
    let value = required_text(doc, node, field_name)?;
    match value.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(error_at_node(
            ScriptErrorCode::InvalidValue,
            format!("{field_name} '{value}' must be true or false"),
            Some(field_name),
            doc,
            node,
        )),
    }
}

/// `<responses>` holds `<forbidden verb="talk" message="door.talk_refused"/>`
/// entries, at most one per verb.
fn parse_responses(
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<Vec<ScriptedRefusal>, MalformedScript> {
    let mut refusals = Vec::<ScriptedRefusal>::new();
    for entry in node.children().filter(|child| child.is_element()) {
        if entry.tag_name().name() != "forbidden" {
            return Err(error_at_node(
                ScriptErrorCode::UnknownElement,
                format!(
                    "unsupported element <{}> in <responses>; expected <forbidden>",
                    entry.tag_name().name()
                ),
                None,
                doc,
                entry,
            ));
        }

        let verb_raw = required_attribute(doc, entry, "verb", "forbidden")?;
        let Some(verb) = Verb::from_token(&verb_raw) else {
            let allowed = Verb::ALL
                .iter()
                .map(|verb| verb.token())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(error_at_node(
                ScriptErrorCode::InvalidValue,
                format!("unknown verb '{verb_raw}'; allowed values: {allowed}"),
                Some("verb"),
                doc,
                entry,
            ));
        };
        if refusals.iter().any(|refusal| refusal.verb == verb) {
            return Err(error_at_node(
                ScriptErrorCode::DuplicateField,
                format!("more than one <forbidden> entry for verb '{verb}'"),
                Some("verb"),
                doc,
                entry,
            ));
        }

        let message_key = required_attribute(doc, entry, "message", "forbidden")?;
        if !is_message_key(&message_key) {
            return Err(error_at_node(
                ScriptErrorCode::InvalidValue,
                format!(
                    "message '{message_key}' must be a dotted key of lowercase ascii, digits and '_'"
                ),
                Some("message"),
                doc,
                entry,
            ));
        }
        refusals.push(ScriptedRefusal { verb, message_key });
    }
    Ok(refusals)
}

fn is_message_key(value: &str) -> bool {
    value.split('.').count() >= 2
        && value.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')
        })
}

/// Accepts `x y` or `x, y`.
fn parse_vec2(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
    positive: bool,
) -> Result<Vec2, MalformedScript> {
    let value = required_text(doc, node, field_name)?;
    let invalid = |reason: &str| {
        error_at_node(
            ScriptErrorCode::InvalidValue,
            format!("{field_name} '{value}' {reason}"),
            Some(field_name),
            doc,
            node,
        )
    };

    let parts = value
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();
    let [x, y] = parts.as_slice() else {
        return Err(invalid("must have exactly two numbers"));
    };
    let (Ok(x), Ok(y)) = (x.parse::<f32>(), y.parse::<f32>()) else {
        return Err(invalid("is not a pair of numbers"));
    };
    let parsed = Vec2::new(x, y);
    if !parsed.is_finite() {
        return Err(invalid("must be finite"));
    }
    if positive && (parsed.x <= 0.0 || parsed.y <= 0.0) {
        return Err(invalid("must be > 0"));
    }
    Ok(parsed)
}

fn parse_single_reference(
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field: &'static str,
) -> Result<Reference, MalformedScript> {
    let value = required_text(doc, node, field)?;
    if value.split_whitespace().count() != 1 {
        return Err(error_at_node(
            ScriptErrorCode::InvalidValue,
            format!("{field} must name exactly one id, got '{value}'"),
            Some(field),
            doc,
            node,
        ));
    }
    Ok(Reference {
        target: value,
        field,
        location: location_of(doc, node),
    })
}

fn parse_reference_list(doc: &Document<'_>, node: Node<'_, '_>, field: &'static str) -> Vec<Reference> {
    let location = location_of(doc, node);
    node.text()
        .unwrap_or_default()
        .split_whitespace()
        .map(|target| Reference {
            target: target.to_string(),
            field,
            location,
        })
        .collect()
}

fn location_of(doc: &Document<'_>, node: Node<'_, '_>) -> SourceLocation {
    let pos = doc.text_pos_at(node.range().start);
    SourceLocation {
        line: pos.row as usize,
        column: pos.col as usize,
    }
}

fn error_at_node(
    code: ScriptErrorCode,
    message: String,
    field: Option<&str>,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> MalformedScript {
    error_at(code, message, field, location_of(doc, node))
}

fn error_at(
    code: ScriptErrorCode,
    message: String,
    field: Option<&str>,
    location: SourceLocation,
) -> MalformedScript {
    MalformedScript {
        code,
        message,
        field: field.map(str::to_string),
        file_path: None,
        location: Some(location),
    }
}
