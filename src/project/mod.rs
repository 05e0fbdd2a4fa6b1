//! AppGameKit project files: the `.agk` INI, `main.agc` version and
//! include tags.

mod agk;
mod ini;
mod tags;

pub use agk::{find_version, AgkProject, IGNORE_FILES, MAIN_SOURCE};
pub use ini::IniFile;
pub use tags::{find_tags, parse_tagged_line, substitute_tags, TagGuard, TaggedInclude};
