//! Allow-list of applications worth showing.
//!
//! A data-driven table of matcher rules; extend the table rather than adding
//! branches. System paths and helper processes are rejected before the
//! allow-list runs.

use once_cell::sync::Lazy;
use regex::RegexSet;

const REJECT_PATH_PREFIXES: &[&str] = &["/System/", "/usr/", "/Library/"];

const REJECT_NAME_FRAGMENTS: &[&str] = &["XPCService", "HelperTool", "npm exec", ".framework/"];

/// Case-insensitive matchers for known professional applications.
const ALLOW_PATTERNS: &[&str] = &[
    // Development tools and IDEs
    r"^cursor$",
    r"^zed$",
    r"^code$",
    r"^visual studio code$",
    r"^xcode$",
    r"^intellij idea$",
    r"^pycharm$",
    r"^webstorm$",
    r"^phpstorm$",
    r"^sublime text$",
    r"^atom$",
    r"^vim$",
    r"^emacs$",
    // Warp terminal ships its binary as "stable"
    r"^stable$",
    r"^iterm2?$",
    r"^terminal$",
    r"^hyper$",
    // Creative and design tools
    r"^adobe photoshop",
    r"^adobe illustrator",
    r"^adobe after effects",
    r"^adobe premiere pro",
    r"^adobe lightroom",
    r"^adobe indesign",
    r"^adobe acrobat",
    r"^adobe bridge",
    r"^adobe audition",
    r"^figma$",
    r"^sketch$",
    r"^canva$",
    r"^affinity",
    r"^final cut pro$",
    r"^logic pro$",
    r"^pro tools$",
    r"^blender$",
    r"^cinema 4d$",
    r"^maya$",
    r"^3ds max$",
    // Office and productivity
    r"^microsoft word$",
    r"^microsoft excel$",
    r"^microsoft powerpoint$",
    r"^microsoft outlook$",
    r"^microsoft project$",
    r"^microsoft visio$",
    r"^notion$",
    r"^obsidian$",
    r"^roam research$",
    r"^logseq$",
    r"^keynote$",
    r"^pages$",
    r"^numbers$",
    // Browsers
    r"^google chrome$",
    r"^chrome$",
    r"^safari$",
    r"^firefox$",
    r"^microsoft edge$",
    r"^brave browser$",
    r"^opera$",
    r"^arc$",
    // Database and API tools
    r"^tableplus$",
    r"^sequel pro$",
    r"^navicat$",
    r"^dbeaver$",
    r"^postman$",
    r"^insomnia$",
    r"^paw$",
    // Professional software
    r"^autocad$",
    r"^solidworks$",
    r"^fusion 360$",
    r"^unity$",
    r"^unreal engine$",
    r"^godot$",
    r"^docker desktop$",
    r"^vmware fusion$",
    r"^parallels desktop$",
    r"^wireshark$",
    r"^charles$",
    r"^sourcetree$",
    r"^github desktop$",
    r"^gitkraken$",
];

static ALLOW_RULES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(ALLOW_PATTERNS.iter().map(|pattern| format!("(?i){pattern}")))
        .expect("allow-list patterns are valid")
});

/// Check whether a cleaned process name is worth surfacing.
pub fn is_interesting_app(name: &str) -> bool {
    if REJECT_PATH_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        || REJECT_NAME_FRAGMENTS.iter().any(|fragment| name.contains(fragment))
    {
        return false;
    }

    ALLOW_RULES.is_match(name)
}
