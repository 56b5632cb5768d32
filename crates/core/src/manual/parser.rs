//! Line-shape parser that turns a field manual into a [`Catalog`].
//!
//! The manual is a page-numbered text dump with no markup. Structure is
//! recovered from the shape of each line alone:
//!
//! * page numbers are skipped
//! * section labels toggle the Forge World, Legends, allies and enhancement
//!   sections
//! * all-uppercase lines open a faction
//! * lines ending in the points marker are cost lines
//! * anything else names a datasheet, continues a wrapped title, or buffers
//!   the first half of a wrapped option name
//!
//! Lines that look like cost lines but do not parse are logged and skipped so
//! that one bad line never costs a whole version.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use super::fixes::{apply_fixups, default_fixups, Fixup};
use crate::{
    boarding::{DETACHMENT_CATEGORY, GENERIC_CATEGORY},
    config::{listed, CatalogConfig},
    error::ParseError,
    models::{Catalog, Datasheet, Detachment, Faction, ManualVersion, UnitOption},
    names::name_equals,
};

/// Version token used when the header cannot be read.
pub const UNKNOWN_VERSION: &str = "UNKNOWN";

static MODEL_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)\s+models?$").expect("invalid model count regex"));
static MODEL_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s+models?\b").expect("invalid model mention regex"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

/// Parsed pieces of a cost line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CostLine {
    text: String,
    delta: Option<i32>,
    bonus: bool,
    points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    ForgeWorld,
    Legends,
    Allies(String),
    Enhancements,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind<'l> {
    PageNumber,
    Section(Section),
    Faction(String),
    Cost(CostLine),
    /// Carries the points marker but matches no cost shape.
    Malformed,
    Bare(&'l str),
}

/// Builds catalogs from manual text using the configured tables.
pub struct ManualParser<'c> {
    config: &'c CatalogConfig,
    fixups: Vec<Fixup>,
    cost_line: Regex,
    marker: Regex,
}

impl<'c> ManualParser<'c> {
    /// Prepare a parser; the built-in fixups run before `extra_fixups`.
    pub fn new(config: &'c CatalogConfig) -> Result<Self, ParseError> {
        let marker = regex::escape(&config.parser.points_marker);
        let cost_line = Regex::new(&format!(
            r"^(?P<text>.*?)[\s.]*(?:\((?P<delta>[-+−]?\s*\d+)\)[\s.]*)?(?P<bonus>\+\s*)?(?P<points>\d+)\s*{marker}\.?$"
        ))?;
        let marker = Regex::new(&format!(r"(?:^|[^A-Za-z]){marker}(?:$|[^A-Za-z])"))?;
        let mut fixups = default_fixups();
        fixups.extend(config.extra_fixups.iter().cloned());
        Ok(Self {
            config,
            fixups,
            cost_line,
            marker,
        })
    }

    /// Parse one manual version. Never fails; anomalies leave gaps.
    pub fn parse(&self, text: &str) -> Catalog {
        let fixed = apply_fixups(text, &self.fixups);
        let (version, body) = self.split_header(&fixed);

        let mut state = ParseState::default();
        for (index, raw) in body.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            match self.classify(line) {
                LineKind::PageNumber => {}
                LineKind::Section(section) => state.enter_section(section),
                LineKind::Faction(name) => state.open_faction(name),
                LineKind::Cost(cost) => state.add_cost(index + 1, line, cost),
                LineKind::Malformed => {
                    warn!(line = index + 1, text = %line, "Unrecognised cost line");
                    state.pending = None;
                }
                LineKind::Bare(text) => state.bare_line(self.config, index + 1, text),
            }
        }
        state.inject_boarding_enhancements(self.config);

        let catalog = state.finish(version);
        info!(
            version = %catalog.version(),
            factions = catalog.factions().len(),
            datasheets = catalog.datasheets().len(),
            "Parsed field manual"
        );
        catalog
    }

    /// Separate the header from the body and read the version token.
    fn split_header<'t>(&self, text: &'t str) -> (ManualVersion, &'t str) {
        let settings = &self.config.parser;
        let Some((header, rest)) = text.split_once(settings.copyright_marker.as_str()) else {
            warn!("Copyright marker not found, version unknown");
            return (ManualVersion::new(UNKNOWN_VERSION), text);
        };
        let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        let version = header
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .nth(settings.version_line);
        match version {
            Some(token) => (ManualVersion::new(token), body),
            None => {
                warn!(line = settings.version_line, "Version line missing from header");
                (ManualVersion::new(UNKNOWN_VERSION), body)
            }
        }
    }

    fn classify<'l>(&self, line: &'l str) -> LineKind<'l> {
        let settings = &self.config.parser;
        if line.chars().all(|ch| ch.is_ascii_digit()) {
            return LineKind::PageNumber;
        }
        if name_equals(line, &settings.forge_world_label) {
            return LineKind::Section(Section::ForgeWorld);
        }
        if name_equals(line, &settings.legends_label) {
            return LineKind::Section(Section::Legends);
        }
        if name_equals(line, &settings.enhancements_label) {
            return LineKind::Section(Section::Enhancements);
        }
        if let Some(tag) = settings.ally_tag(line) {
            return LineKind::Section(Section::Allies(tag.to_string()));
        }
        if is_heading(line) {
            return LineKind::Faction(self.faction_name(line));
        }
        if self.marker.is_match(line) {
            return self
                .parse_cost(line)
                .map(LineKind::Cost)
                .unwrap_or(LineKind::Malformed);
        }
        LineKind::Bare(line)
    }

    fn parse_cost(&self, line: &str) -> Option<CostLine> {
        let caps = self.cost_line.captures(line)?;
        let points = caps.name("points")?.as_str().parse().ok()?;
        let delta = match caps.name("delta") {
            Some(raw) => {
                let cleaned: String = raw
                    .as_str()
                    .chars()
                    .filter(|ch| !ch.is_whitespace())
                    .map(|ch| if ch == '−' { '-' } else { ch })
                    .collect();
                Some(cleaned.parse().ok()?)
            }
            None => None,
        };
        Some(CostLine {
            text: caps
                .name("text")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            delta,
            bonus: caps.name("bonus").is_some(),
            points,
        })
    }

    /// Upper-cased heading with codex prefixes stripped.
    fn faction_name(&self, line: &str) -> String {
        let upper = line.to_uppercase();
        let stripped = self
            .config
            .parser
            .faction_prefixes
            .iter()
            .find_map(|prefix| upper.strip_prefix(prefix.to_uppercase().as_str()))
            .unwrap_or(&upper);
        WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
    }
}

/// Parse with a one-off parser.
pub fn parse_manual(text: &str, config: &CatalogConfig) -> Result<Catalog, ParseError> {
    Ok(ManualParser::new(config)?.parse(text))
}

fn is_heading(line: &str) -> bool {
    line.chars().any(char::is_alphabetic) && line.to_uppercase() == line
}

fn starts_with_digit(line: &str) -> bool {
    line.chars().next().map(|ch| ch.is_ascii_digit()).unwrap_or(false)
}

/// Set the config-driven flags from the owning faction's tables, falling
/// back to the parent faction's tables for sub-factions.
fn apply_flags(config: &CatalogConfig, sheet: &mut Datasheet) {
    let tables = config.faction_tables(&sheet.faction).or_else(|| {
        sheet
            .sub_faction
            .as_deref()
            .and_then(|parent| config.faction_tables(parent))
    });
    let Some(tables) = tables else {
        return;
    };
    sheet.battle_line = listed(&tables.battle_line, &sheet.name);
    sheet.epic_hero = listed(&tables.epic_hero, &sheet.name);
    sheet.dedicated_transport = listed(&tables.dedicated_transport, &sheet.name);
    sheet.character = listed(&tables.character, &sheet.name);
    sheet.fortification = listed(&tables.fortification, &sheet.name);
}

/// Mutable state threaded through the line walk.
#[derive(Debug, Default)]
struct ParseState {
    factions: Vec<Faction>,
    datasheets: Vec<Datasheet>,
    faction: Option<usize>,
    datasheet: Option<usize>,
    sentinel: Option<usize>,
    detachment: Option<String>,
    /// The open detachment already has at least one enhancement.
    detachment_filled: bool,
    in_enhancements: bool,
    forge_world: bool,
    legends: bool,
    allies: Option<String>,
    /// First half of an option name wrapped onto the next line.
    pending: Option<String>,
}

impl ParseState {
    fn leave_block(&mut self) {
        self.datasheet = None;
        self.detachment = None;
        self.detachment_filled = false;
        self.in_enhancements = false;
        self.pending = None;
    }

    fn enter_section(&mut self, section: Section) {
        self.leave_block();
        match section {
            Section::ForgeWorld => {
                self.forge_world = true;
                self.legends = false;
                self.allies = None;
            }
            Section::Legends => {
                self.legends = true;
                self.forge_world = false;
                self.allies = None;
            }
            Section::Allies(tag) => self.allies = Some(tag),
            Section::Enhancements => {
                self.in_enhancements = true;
                self.datasheet = Some(self.sentinel_index());
            }
        }
    }

    fn open_faction(&mut self, name: String) {
        self.leave_block();
        self.allies = None;
        let index = match self
            .factions
            .iter()
            .position(|faction| faction.name == name)
        {
            Some(index) => index,
            None => {
                debug!(faction = %name, "New faction");
                self.factions.push(Faction {
                    name,
                    detachments: Vec::new(),
                });
                self.factions.len() - 1
            }
        };
        self.faction = Some(index);
    }

    fn sentinel_index(&mut self) -> usize {
        match self.sentinel {
            Some(index) => index,
            None => {
                self.datasheets.push(Datasheet::enhancements_sentinel());
                let index = self.datasheets.len() - 1;
                self.sentinel = Some(index);
                index
            }
        }
    }

    fn add_cost(&mut self, line_no: usize, line: &str, cost: CostLine) {
        let pending = self.pending.take();
        let Some(index) = self.datasheet else {
            warn!(line = line_no, text = %line, "Cost line outside a datasheet");
            return;
        };

        if self.in_enhancements {
            let Some(detachment) = self.detachment.clone() else {
                warn!(line = line_no, text = %line, "Enhancement before any detachment");
                return;
            };
            let name = join_name(pending, &cost.text).unwrap_or_default();
            let mut option = UnitOption::enhancement(name, cost.points, detachment, None);
            option.bonus = cost.bonus;
            option.delta = cost.delta;
            self.datasheets[index].sizes.push(option);
            self.detachment_filled = true;
            return;
        }

        let sheet = &mut self.datasheets[index];
        let mut option = if let Some(caps) = MODEL_COUNT.captures(&cost.text) {
            let name = pending.unwrap_or_else(|| sheet.name.clone());
            let mut option = UnitOption::new(name, cost.points);
            option.models = caps[1].parse().ok();
            option
        } else {
            let models = MODEL_MENTION
                .captures(&cost.text)
                .and_then(|caps| caps[1].parse().ok());
            let name = join_name(pending, &cost.text).unwrap_or_else(|| sheet.name.clone());
            let mut option = UnitOption::new(name, cost.points);
            option.models = models;
            option
        };
        option.bonus = cost.bonus;
        option.delta = cost.delta;
        sheet.sizes.push(option);
    }

    fn bare_line(&mut self, config: &CatalogConfig, line_no: usize, line: &str) {
        if self.in_enhancements {
            if self.detachment.is_some() && starts_with_digit(line) {
                self.buffer_fragment(line);
            } else if self.detachment.is_some() && !self.detachment_filled {
                self.extend_detachment(line);
            } else {
                self.open_detachment(line_no, line);
            }
            return;
        }

        if let Some(index) = self.datasheet {
            let sheet = &mut self.datasheets[index];
            if sheet.sizes.is_empty() && self.pending.is_none() && !sheet.is_enhancements() {
                sheet.name = format!("{} {}", sheet.name, line);
                apply_flags(config, sheet);
                return;
            }
        }

        if starts_with_digit(line) {
            self.buffer_fragment(line);
            return;
        }
        self.start_datasheet(config, line_no, line);
    }

    fn buffer_fragment(&mut self, line: &str) {
        self.pending = Some(match self.pending.take() {
            Some(existing) => format!("{existing} {line}"),
            None => line.to_string(),
        });
    }

    fn open_detachment(&mut self, line_no: usize, name: &str) {
        let Some(faction) = self.faction.map(|index| &mut self.factions[index]) else {
            warn!(line = line_no, text = %name, "Detachment outside a faction");
            return;
        };
        if !faction
            .detachments
            .iter()
            .any(|detachment| name_equals(&detachment.name, name))
        {
            faction.detachments.push(Detachment {
                name: name.to_string(),
            });
        }
        self.detachment = Some(name.to_string());
        self.detachment_filled = false;
        self.pending = None;
    }

    fn extend_detachment(&mut self, line: &str) {
        let Some(current) = self.detachment.take() else {
            return;
        };
        let joined = format!("{current} {line}");
        if let Some(faction) = self.faction.map(|index| &mut self.factions[index]) {
            if let Some(detachment) = faction
                .detachments
                .iter_mut()
                .rev()
                .find(|detachment| detachment.name == current)
            {
                detachment.name = joined.clone();
            }
        }
        self.detachment = Some(joined);
    }

    fn start_datasheet(&mut self, config: &CatalogConfig, line_no: usize, name: &str) {
        let Some(faction) = self.faction.map(|index| self.factions[index].name.clone()) else {
            warn!(line = line_no, text = %name, "Datasheet outside a faction");
            self.datasheet = None;
            return;
        };
        let mut sheet = Datasheet::new(name, faction);
        sheet.sub_faction = config.parent_faction(&sheet.faction).map(str::to_string);
        sheet.forge_world = self.forge_world;
        sheet.legends = self.legends;
        sheet.allies = self.allies.clone();
        apply_flags(config, &mut sheet);
        self.datasheets.push(sheet);
        self.datasheet = Some(self.datasheets.len() - 1);
    }

    /// Add the configured boarding actions enhancements as free options.
    fn inject_boarding_enhancements(&mut self, config: &CatalogConfig) {
        let boarding = &config.boarding_actions;
        for (faction, detachment, slots) in boarding.iter() {
            match self
                .factions
                .iter_mut()
                .find(|candidate| name_equals(&candidate.name, faction))
            {
                Some(owner) => {
                    if !owner
                        .detachments
                        .iter()
                        .any(|existing| name_equals(&existing.name, detachment))
                    {
                        owner.detachments.push(Detachment {
                            name: detachment.to_string(),
                        });
                    }
                }
                None => debug!(faction = %faction, "Boarding faction not in manual"),
            }

            let generic = boarding
                .generic_enhancements
                .iter()
                .map(|name| (name, GENERIC_CATEGORY));
            let specific = slots
                .enhancements
                .iter()
                .map(|name| (name, DETACHMENT_CATEGORY));
            let options: Vec<UnitOption> = generic
                .chain(specific)
                .map(|(name, category)| {
                    UnitOption::enhancement(name.as_str(), 0, detachment, Some(category.to_string()))
                })
                .collect();
            if options.is_empty() {
                continue;
            }

            let index = self.sentinel_index();
            let sentinel = &mut self.datasheets[index];
            for option in options {
                let duplicate = sentinel.sizes.iter().any(|existing| {
                    name_equals(&existing.name, &option.name)
                        && existing.detachment.as_deref().map(str::to_lowercase)
                            == option.detachment.as_deref().map(str::to_lowercase)
                });
                if !duplicate {
                    sentinel.sizes.push(option);
                }
            }
        }
    }

    fn finish(self, version: ManualVersion) -> Catalog {
        let datasheets = self
            .datasheets
            .into_iter()
            .filter(|sheet| {
                if sheet.sizes.is_empty() {
                    warn!(datasheet = %sheet.name, faction = %sheet.faction, "Dropping datasheet without costs");
                    false
                } else {
                    true
                }
            })
            .collect();
        Catalog::new(version, self.factions, datasheets)
    }
}

fn join_name(pending: Option<String>, text: &str) -> Option<String> {
    match (pending, text.is_empty()) {
        (Some(pending), true) => Some(pending),
        (Some(pending), false) => Some(format!("{pending} {text}")),
        (None, false) => Some(text.to_string()),
        (None, true) => None,
    }
}
