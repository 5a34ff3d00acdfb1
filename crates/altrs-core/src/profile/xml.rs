// Altrs Profile Files
// Versioned XML persistence for profiles
//
// Version history:
//   1  sources, situations and mappings
//   2  apps gain the `snooze` attribute
//   3  screen regions and the action-list `execution` attribute

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::action::{ActionKind, ActionList, ExecutionMode};
use crate::event::{ControlType, EventArgs, EventReason};
use crate::ids::{ItemId, DEFAULT_ID};
use crate::item::{AppItem, Named, NamedItem, NamedItemList};
use crate::source::{SourceSpec, SourceType};
use crate::state::LogicalState;
use crate::window::Rect;

use super::region::{RegionShape, ScreenRegion};
use super::{Profile, ProfileError};

/// Format version written by this build
pub const PROFILE_VERSION: u32 = 3;

const SNOOZE_VERSION: u32 = 2;
const REGIONS_VERSION: u32 = 3;

type Attrs = HashMap<String, String>;

fn xml_error(e: impl Display) -> ProfileError {
    ProfileError::Xml(e.to_string())
}

fn bad_attribute(element: &str, name: &str, reason: impl Display) -> ProfileError {
    ProfileError::InvalidAttribute {
        name: format!("{}.{}", element, name),
        reason: reason.to_string(),
    }
}

fn required<'a>(attrs: &'a Attrs, element: &str, name: &str) -> Result<&'a str, ProfileError> {
    attrs
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| bad_attribute(element, name, "missing"))
}

fn parse<T>(attrs: &Attrs, element: &str, name: &str) -> Result<T, ProfileError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = required(attrs, element, name)?;
    raw.trim()
        .parse()
        .map_err(|e| bad_attribute(element, name, format!("'{}': {}", raw, e)))
}

fn parse_or<T>(attrs: &Attrs, element: &str, name: &str, default: T) -> Result<T, ProfileError>
where
    T: FromStr,
    T::Err: Display,
{
    if attrs.contains_key(name) {
        parse(attrs, element, name)
    } else {
        Ok(default)
    }
}

/// Replace the item with the same id, or append it
fn upsert<T: Named>(list: &mut NamedItemList<T>, item: T) {
    match list.get_by_id_mut(item.id()) {
        Some(slot) => *slot = item,
        None => {
            list.add(item);
        }
    }
}

struct ProfileReader {
    profile: Option<Profile>,
    version: u32,
    pending: Option<ActionList>,
}

impl ProfileReader {
    fn profile(&mut self, element: &str) -> Result<&mut Profile, ProfileError> {
        self.profile
            .as_mut()
            .ok_or_else(|| ProfileError::Xml(format!("<{}> outside <Profile>", element)))
    }

    fn element(&mut self, name: &str, attrs: &Attrs, is_empty: bool) -> Result<(), ProfileError> {
        match name {
            "Profile" => {
                let version = parse_or(attrs, name, "version", 1u32)?;
                if version > PROFILE_VERSION {
                    return Err(ProfileError::UnsupportedVersion(version));
                }
                self.version = version;
                let title = attrs.get("name").cloned().unwrap_or_default();
                self.profile = Some(Profile::empty(title));
            }
            "Source" => {
                let source = SourceSpec::new(
                    parse(attrs, name, "id")?,
                    required(attrs, name, "name")?,
                    parse::<SourceType>(attrs, name, "type")?,
                );
                upsert(&mut self.profile(name)?.sources, source);
            }
            "Mode" | "Page" => {
                let item = NamedItem::new(parse(attrs, name, "id")?, required(attrs, name, "name")?);
                let profile = self.profile(name)?;
                let list = if name == "Mode" {
                    &mut profile.modes
                } else {
                    &mut profile.pages
                };
                upsert(list, item);
            }
            "App" => {
                let mut app = AppItem::new(parse(attrs, name, "id")?, required(attrs, name, "name")?);
                if let Some(rule) = attrs.get("rule").filter(|r| !r.trim().is_empty()) {
                    app = app
                        .with_rule(rule)
                        .map_err(|e| bad_attribute(name, "rule", e))?;
                }
                if self.version >= SNOOZE_VERSION {
                    app = app.with_snooze(parse_or(attrs, name, "snooze", false)?);
                }
                upsert(&mut self.profile(name)?.apps, app);
            }
            "Region" => {
                if self.version < REGIONS_VERSION {
                    log::warn!("Ignoring <Region> in version {} profile", self.version);
                    return Ok(());
                }
                let region = ScreenRegion::new(
                    parse(attrs, name, "id")?,
                    required(attrs, name, "name")?,
                    Rect::new(
                        parse(attrs, name, "left")?,
                        parse(attrs, name, "top")?,
                        parse(attrs, name, "width")?,
                        parse(attrs, name, "height")?,
                    ),
                    parse_or(attrs, name, "shape", RegionShape::Rectangle)?,
                );
                upsert(&mut self.profile(name)?.regions, region);
            }
            "ActionList" => {
                self.profile(name)?;
                let state = LogicalState::new(
                    parse_or(attrs, name, "mode", DEFAULT_ID)?,
                    parse_or(attrs, name, "app", DEFAULT_ID)?,
                    parse_or(attrs, name, "page", DEFAULT_ID)?,
                );
                let event = EventArgs::new(
                    parse::<ItemId>(attrs, name, "source")?,
                    parse::<ControlType>(attrs, name, "control")?,
                    parse::<u32>(attrs, name, "data")?,
                    parse::<EventReason>(attrs, name, "reason")?,
                );
                let execution = if self.version >= REGIONS_VERSION {
                    parse_or(attrs, name, "execution", ExecutionMode::Parallel)?
                } else {
                    ExecutionMode::Parallel
                };
                // An empty element maps no actions and is dropped
                if !is_empty {
                    self.pending = Some(ActionList::new(state, event, execution));
                }
            }
            "Action" => {
                let list = self
                    .pending
                    .as_mut()
                    .ok_or_else(|| ProfileError::Xml("<Action> outside <ActionList>".into()))?;
                let type_name = required(attrs, name, "type")?;
                let kind = ActionKind::from_params(type_name, attrs)
                    .map_err(|e| bad_attribute(name, "type", e))?;
                list.push(kind);
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<(), ProfileError> {
        if name == b"ActionList" {
            if let Some(list) = self.pending.take() {
                self.profile("ActionList")?.add_action_list(list);
            }
        }
        Ok(())
    }
}

fn attributes(reader: &Reader<&[u8]>, start: &BytesStart) -> Result<Attrs, ProfileError> {
    let mut attrs = Attrs::new();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(xml_error)?;
        attrs.insert(key, value.into_owned());
    }
    Ok(attrs)
}

/// Parse a profile document (without validating it)
pub(super) fn read(text: &str) -> Result<Profile, ProfileError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut state = ProfileReader {
        profile: None,
        version: 1,
        pending: None,
    };

    loop {
        let event = reader.read_event().map_err(|e| {
            ProfileError::Xml(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attrs = attributes(&reader, e)?;
                state.element(&name, &attrs, is_empty)?;
            }
            Event::End(ref e) => state.end(e.name().as_ref())?,
            Event::Eof => break,
            _ => {}
        }
    }

    state
        .profile
        .ok_or_else(|| ProfileError::Xml("no <Profile> element".into()))
}

fn empty_element(
    xml: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, String)],
) -> Result<(), ProfileError> {
    let mut element = BytesStart::new(name);
    for (key, value) in attrs {
        element.push_attribute((*key, value.as_str()));
    }
    xml.write_event(Event::Empty(element)).map_err(xml_error)
}

fn start(xml: &mut Writer<Vec<u8>>, element: BytesStart) -> Result<(), ProfileError> {
    xml.write_event(Event::Start(element)).map_err(xml_error)
}

fn end(xml: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ProfileError> {
    xml.write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

/// Write a list section of empty elements
fn section<T>(
    xml: &mut Writer<Vec<u8>>,
    wrapper: &str,
    element: &str,
    items: &NamedItemList<T>,
    attrs: impl Fn(&T) -> Vec<(&'static str, String)>,
) -> Result<(), ProfileError>
where
    T: Named,
{
    start(xml, BytesStart::new(wrapper))?;
    for item in items {
        let mut all = vec![("id", item.id().to_string()), ("name", item.name().to_string())];
        all.extend(attrs(item));
        empty_element(xml, element, &all)?;
    }
    end(xml, wrapper)
}

/// Serialise a profile at the current format version
pub(super) fn write(profile: &Profile) -> Result<String, ProfileError> {
    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("Profile");
    root.push_attribute(("version", PROFILE_VERSION.to_string().as_str()));
    root.push_attribute(("name", profile.name.as_str()));
    start(&mut xml, root)?;

    section(&mut xml, "Sources", "Source", &profile.sources, |s| {
        vec![("type", s.source_type.to_string())]
    })?;
    section(&mut xml, "Modes", "Mode", &profile.modes, |_| Vec::new())?;
    section(&mut xml, "Apps", "App", &profile.apps, |app| {
        let mut attrs = Vec::new();
        if let Some(rule) = app.rule() {
            attrs.push(("rule", rule.to_string()));
        }
        attrs.push(("snooze", app.snooze().to_string()));
        attrs
    })?;
    section(&mut xml, "Pages", "Page", &profile.pages, |_| Vec::new())?;
    section(&mut xml, "Regions", "Region", &profile.regions, |r| {
        vec![
            ("left", r.rect.left.to_string()),
            ("top", r.rect.top.to_string()),
            ("width", r.rect.width.to_string()),
            ("height", r.rect.height.to_string()),
            ("shape", r.shape.to_string()),
        ]
    })?;

    start(&mut xml, BytesStart::new("Mappings"))?;
    for (state, table) in &profile.mappings {
        for list in table.lists() {
            let event = list.event();
            let mut element = BytesStart::new("ActionList");
            let attrs = [
                ("mode", state.mode_id.to_string()),
                ("app", state.app_id.to_string()),
                ("page", state.page_id.to_string()),
                ("source", event.source_id.to_string()),
                ("control", event.control_type.to_string()),
                ("data", event.control_data.to_string()),
                ("reason", event.reason.to_string()),
                ("execution", list.execution().to_string()),
            ];
            for (key, value) in &attrs {
                element.push_attribute((*key, value.as_str()));
            }
            start(&mut xml, element)?;
            for kind in list.actions() {
                let mut attrs = vec![("type", kind.type_name().to_string())];
                attrs.extend(kind.params());
                empty_element(&mut xml, "Action", &attrs)?;
            }
            end(&mut xml, "ActionList")?;
        }
    }
    end(&mut xml, "Mappings")?;
    end(&mut xml, "Profile")?;

    String::from_utf8(xml.into_inner()).map_err(xml_error)
}
