//! Static language catalogs and the built-in snippet table.
//!
//! These are configuration data, not derived state: the keyword lists, the
//! Minecraft command table, and the packaged snippet resource. A [`Catalog`]
//! value is passed explicitly into every analysis call; there is no global
//! mutable catalog.

use crate::error::CatalogError;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Reserved words of the language.
pub const JMC_KEYWORDS: &[&str] = &[
    "class", "function", "if", "else", "for", "while", "return", "import", "new", "switch",
    "case", "default", "do", "break", "continue",
];

/// Control-flow words that look like calls (`if (...)`) and must never be
/// reported as undefined functions.
pub const FUNCTION_EXCEPTIONS: &[&str] = &["if", "while", "for", "switch"];

/// Decorators the language accepts on functions.
pub const ALLOWED_DECORATORS: &[&str] = &["add", "root", "lazy", "description", "ignore", "param"];

/// The decorator that force-keeps a function even when it is never called.
pub const FORCE_KEEP_DECORATOR: &str = "add";

pub fn is_keyword(word: &str) -> bool {
    JMC_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

pub fn is_allowed_decorator(word: &str) -> bool {
    ALLOWED_DECORATORS.contains(&word)
}

/// Syntax and description metadata for one vanilla command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDoc {
    pub name: &'static str,
    pub syntax: &'static str,
    pub description: &'static str,
}

/// Looks a word up in the command table, case-insensitively.
pub fn command_doc(word: &str) -> Option<&'static CommandDoc> {
    MC_COMMANDS.iter().find(|doc| doc.name.eq_ignore_ascii_case(word))
}

pub fn is_command(word: &str) -> bool {
    command_doc(word).is_some()
}

macro_rules! command_table {
    ($(($name:literal, $syntax:literal, $description:literal),)*) => {
        /// Vanilla command catalog (1.21+), including alias spellings.
        pub const MC_COMMANDS: &[CommandDoc] = &[
            $(CommandDoc { name: $name, syntax: $syntax, description: $description },)*
        ];
    };
}

command_table![
    ("advancement", "advancement (grant|revoke) <targets> ...", "Grants or revokes advancements from players."),
    ("attribute", "attribute <target> <attribute> (get|base|modifier) ...", "Queries, adds, removes or sets entity attributes."),
    ("ban", "ban <targets> [<reason>]", "Adds player(s) to the blacklist."),
    ("ban-ip", "ban-ip <target> [<reason>]", "Adds IP address(es) to the blacklist."),
    ("banlist", "banlist [ips|players]", "Displays the banlist."),
    ("bossbar", "bossbar (add|get|list|remove|set) ...", "Creates and modifies bossbars."),
    ("clear", "clear [<targets>] [<item>] [<maxCount>]", "Clears items from player inventory."),
    ("clone", "clone <begin> <end> <destination> ...", "Copies blocks from one place to another."),
    ("damage", "damage <target> <amount> [<damageType>] ...", "Inflicts damage to entities."),
    ("data", "data (get|merge|modify|remove) ...", "Gets, merges, modifies, or removes entity/block NBT data."),
    ("datapack", "datapack (disable|enable|list) ...", "Controls loaded data packs."),
    ("debug", "debug (start|stop|function)", "Starts or stops a debugging session."),
    ("defaultgamemode", "defaultgamemode <mode>", "Sets the default game mode for new players."),
    ("deop", "deop <targets>", "Revokes operator status from players."),
    ("difficulty", "difficulty <difficulty>", "Sets the difficulty level."),
    ("effect", "effect (clear|give) ...", "Add or remove status effects."),
    ("enchant", "enchant <targets> <enchantment> [<level>]", "Adds an enchantment to a player's selected item."),
    ("execute", "execute (as|at|if|unless|run|...) ...", "Executes another command."),
    ("experience", "experience (add|query|set) ...", "Gives or removes player experience."),
    ("fill", "fill <from> <to> <block> ...", "Fills a region with a specific block."),
    ("fillbiome", "fillbiome <from> <to> <biome> ...", "Changes the biome of an area."),
    ("forceload", "forceload (add|query|remove) ...", "Toggles force-loading of chunks."),
    ("function", "function <name> [arguments]", "Runs a function."),
    ("gamemode", "gamemode <mode> [<target>]", "Sets a player's game mode."),
    ("gamerule", "gamerule <rule> [<value>]", "Sets or queries a game rule value."),
    ("give", "give <targets> <item> [<amount>]", "Gives an item to a player."),
    ("help", "help [<command>]", "Provides help for commands."),
    ("item", "item (modify|replace) ...", "Manipulates items in inventories or blocks."),
    ("jfr", "jfr (start|stop)", "Starts or stops JFR profiling."),
    ("kick", "kick <targets> [<reason>]", "Kicks a player from the server."),
    ("kill", "kill [<targets>]", "Kills entities (including players)."),
    ("list", "list [uuids]", "Lists players on the server."),
    ("locate", "locate (structure|biome|poi) ...", "Locates the nearest structure, biome, or POI."),
    ("loot", "loot (spawn|replace|give|insert) ...", "Drops items from loot tables into inventory or world."),
    ("me", "me <action>", "Displays a message about yourself."),
    ("msg", "msg <targets> <message>", "Sends a private message to one or more players."),
    ("op", "op <targets>", "Grants operator status to a player."),
    ("pardon", "pardon <targets>", "Removes entries from the blacklist."),
    ("pardon-ip", "pardon-ip <target>", "Removes IP entries from the blacklist."),
    ("particle", "particle <name> [<pos>] ...", "Creates particles."),
    ("perf", "perf (start|stop)", "Captures profiling data."),
    ("place", "place (feature|jigsaw|structure|template) ...", "Places a configured feature, structure, etc."),
    ("playsound", "playsound <sound> <source> <targets> ...", "Plays a sound."),
    ("publish", "publish [<port>]", "Opens single-player world to LAN."),
    ("random", "random (value|roll) ...", "Generates random values or checks."),
    ("recipe", "recipe (give|take) ...", "Gives or takes player recipes."),
    ("reload", "reload", "Reloads data packs."),
    ("return", "return <value>", "Controls return values in functions."),
    ("ride", "ride <target> (mount|dismount) ...", "Makes entities ride other entities."),
    ("rotate", "rotate <target> <rotation>", "Rotates an entity."),
    ("save-all", "save-all [flush]", "Saves the server to disk."),
    ("save-off", "save-off", "Disables automatic server saving."),
    ("save-on", "save-on", "Enables automatic server saving."),
    ("say", "say <message>", "Displays a message to multiple players."),
    ("schedule", "schedule (function|clear) ...", "Delays the execution of a function."),
    ("scoreboard", "scoreboard (objectives|players) ...", "Manages scoreboard objectives and players."),
    ("seed", "seed", "Displays the world seed."),
    ("setblock", "setblock <pos> <block> ...", "Changes a block."),
    ("setidletimeout", "setidletimeout <minutes>", "Sets the time before idle players are kicked."),
    ("setworldspawn", "setworldspawn [<pos>] [<angle>]", "Sets the world spawn."),
    ("spawnpoint", "spawnpoint [<targets>] [<pos>] [<angle>]", "Sets the spawn point for a player."),
    ("spectate", "spectate [<target>] [<player>]", "Makes a player spectate an entity."),
    ("spreadplayers", "spreadplayers <center> <spreadDistance> ...", "Teleports entities to random locations."),
    ("stop", "stop", "Stops the server."),
    ("stopsound", "stopsound <targets> [<source>] [<sound>]", "Stops a sound."),
    ("summon", "summon <entity> [<pos>] [<nbt>]", "Summons an entity."),
    ("tag", "tag <targets> (add|remove|list) ...", "Controls entity tags."),
    ("team", "team (add|empty|join|leave|list|modify|remove) ...", "Modifies teams."),
    ("teammsg", "teammsg <message>", "Sends a message to all players on your team."),
    ("teleport", "teleport <targets> <location>", "Teleports entities."),
    ("tell", "tell <targets> <message>", "Sends a private message."),
    ("tellraw", "tellraw <targets> <message>", "Displays a JSON message to players."),
    ("tick", "tick (query|rate|step|sprint|freeze|unfreeze) ...", "Controls the server tick flow."),
    ("time", "time (add|query|set) <value>", "Changes or queries the world's game time."),
    ("title", "title <targets> (clear|reset|title|subtitle|actionbar|times) ...", "Manages screen titles."),
    ("tm", "tm <message>", "Sends a team message (Alias of teammsg)."),
    ("tp", "tp <targets> <location>", "Teleports entities (Alias of teleport)."),
    ("transfer", "transfer <hostname> [<port>]", "Transfers players to another server."),
    ("trigger", "trigger <objective> [add|set]", "Sets a trigger to be activated."),
    ("w", "w <targets> <message>", "Sends a private message (Alias of msg)."),
    ("weather", "weather (clear|rain|thunder) [<duration>]", "Sets the weather."),
    ("whitelist", "whitelist (add|list|off|on|reload|remove)", "Manages the server whitelist."),
    ("worldborder", "worldborder (add|center|damage|get|set|warning) ...", "Manages the world border."),
    ("xp", "xp (add|query|set) ...", "Manages experience (Alias of experience)."),
];

/// NBT value families used by the hover heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbtType {
    String,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Compound,
    List,
    Any,
}

impl NbtType {
    pub fn as_str(self) -> &'static str {
        match self {
            NbtType::String => "NBTString",
            NbtType::Byte => "NBTByte",
            NbtType::Short => "NBTShort",
            NbtType::Int => "NBTInt",
            NbtType::Long => "NBTLong",
            NbtType::Float => "NBTFloat",
            NbtType::Double => "NBTDouble",
            NbtType::Compound => "NBTCompound",
            NbtType::List => "NBTList",
            NbtType::Any => "Any",
        }
    }

    /// Guesses the NBT family of a literal from its shape and numeric
    /// suffix. Heuristic only.
    pub fn infer(literal: &str) -> NbtType {
        let value = literal.trim();
        if value.starts_with(['"', '\'', '`']) {
            return NbtType::String;
        }
        if value.starts_with('{') {
            return NbtType::Compound;
        }
        if value.starts_with('[') {
            return NbtType::List;
        }
        if value == "true" || value == "false" {
            return NbtType::Byte;
        }

        let digits = value.strip_prefix('-').unwrap_or(value);
        if digits.is_empty() {
            return NbtType::Any;
        }
        if let Some(suffix) = digits.chars().last().filter(|c| c.is_ascii_alphabetic()) {
            let body = &digits[..digits.len() - 1];
            let integral = !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit());
            let decimal = is_decimal(body);
            return match suffix.to_ascii_lowercase() {
                'b' if integral => NbtType::Byte,
                's' if integral => NbtType::Short,
                'l' if integral => NbtType::Long,
                'f' if integral || decimal => NbtType::Float,
                'd' if integral || decimal => NbtType::Double,
                _ => NbtType::Any,
            };
        }
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            return NbtType::Int;
        }
        if is_decimal(digits) {
            return NbtType::Float;
        }
        NbtType::Any
    }
}

fn is_decimal(text: &str) -> bool {
    match text.split_once('.') {
        Some((whole, fraction)) => {
            !whole.is_empty()
                && !fraction.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && fraction.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

impl fmt::Display for NbtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One built-in function snippet from the packaged resource.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snippet {
    pub body: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// The built-in function table, keyed by dotted function name. Loaded once
/// by the host at startup; load failure degrades to an empty catalog rather
/// than aborting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnippetCatalog {
    snippets: HashMap<String, Snippet>,
}

impl SnippetCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let snippets: HashMap<String, Snippet> =
            serde_json::from_str(json).map_err(|source| CatalogError::Parse { source })?;
        Ok(Self { snippets })
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The snippet table packaged with the crate. Falls back to an empty
    /// catalog if the resource is unparsable.
    pub fn bundled() -> Self {
        match Self::from_json(include_str!("../resources/snippets.json")) {
            Ok(catalog) => catalog,
            Err(error) => {
                warn!("bundled snippet catalog failed to load, continuing without built-ins: {error}");
                Self::empty()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn get(&self, name: &str) -> Option<&Snippet> {
        self.snippets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snippets.contains_key(name)
    }

    /// Case-insensitive membership, for the unknown-identifier check.
    pub fn contains_ignore_case(&self, name: &str) -> bool {
        self.snippets.keys().any(|k| k.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.snippets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Snippet)> {
        self.snippets.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Everything an analysis pass consults that is configuration rather than
/// source: the static tables above plus the loaded snippet catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub snippets: SnippetCatalog,
}

impl Catalog {
    pub fn new(snippets: SnippetCatalog) -> Self {
        Self { snippets }
    }

    pub fn with_bundled_snippets() -> Self {
        Self::new(SnippetCatalog::bundled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lookup_case_insensitive() {
        assert!(is_command("execute"));
        assert!(is_command("EXECUTE"));
        assert!(is_command("Tellraw"));
        assert!(!is_command("frobnicate"));
        assert_eq!(command_doc("tp").unwrap().syntax, "tp <targets> <location>");
    }

    #[test]
    fn test_keyword_lookup() {
        assert!(is_keyword("function"));
        assert!(is_keyword("While"));
        assert!(!is_keyword("say"));
    }

    #[test]
    fn test_nbt_inference() {
        assert_eq!(NbtType::infer("\"hello\""), NbtType::String);
        assert_eq!(NbtType::infer("{a: 1}"), NbtType::Compound);
        assert_eq!(NbtType::infer("[1, 2]"), NbtType::List);
        assert_eq!(NbtType::infer("true"), NbtType::Byte);
        assert_eq!(NbtType::infer("12b"), NbtType::Byte);
        assert_eq!(NbtType::infer("-3s"), NbtType::Short);
        assert_eq!(NbtType::infer("40000L"), NbtType::Long);
        assert_eq!(NbtType::infer("1.5f"), NbtType::Float);
        assert_eq!(NbtType::infer("2.25"), NbtType::Float);
        assert_eq!(NbtType::infer("9d"), NbtType::Double);
        assert_eq!(NbtType::infer("42"), NbtType::Int);
        assert_eq!(NbtType::infer("@a"), NbtType::Any);
    }

    #[test]
    fn test_snippet_catalog_from_json() {
        let catalog = SnippetCatalog::from_json(
            r#"{ "Timer.add": { "body": ["Timer.add(${1:objective}, ${2:ticks});"], "description": "Starts a timer." } }"#,
        )
        .unwrap();
        assert!(catalog.contains("Timer.add"));
        assert!(catalog.contains_ignore_case("timer.ADD"));
        assert!(!catalog.contains("Timer.remove"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(SnippetCatalog::from_json("not json").is_err());
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = SnippetCatalog::bundled();
        assert!(!catalog.is_empty());
        assert!(catalog.contains("Player.onEvent"));
    }
}
