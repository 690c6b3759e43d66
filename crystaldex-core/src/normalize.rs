//! Identifier normalization shared by every extractor.
//!
//! The disassembly spells the same entity several ways: `POKE_BALL` in
//! constants, `PokeBallDesc:` in labels, `"Poke Ball"` in names and
//! `"Poké Ball"` in display text. Cross-file joins only work if every one of
//! those resolves to the same canonical key, so all extractors go through
//! [`normalize_id`] for items and [`normalize_location_key`] for maps.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref DIRECTIVE_RE: Regex = Regex::new(r"^(?:dbw|db|li)\s+").unwrap();
    static ref TM_HM_RE: Regex = Regex::new(r"(?i)^(tm|hm)[_ ]?([a-z0-9_ ]+)$").unwrap();
    static ref CONSTANT_RE: Regex = Regex::new(r"^[A-Z0-9_]+$").unwrap();
    static ref LOWER_UPPER_RE: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();
    static ref ACRONYM_RE: Regex = Regex::new(r"([A-Z])([A-Z][a-z])").unwrap();

    static ref ROUTE_KEY_RE: Regex = Regex::new(r"^route(\d+)(_|$)").unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"[\s\-.]+").unwrap();
    static ref BASEMENT_RE: Regex = Regex::new(r"_b(\d+)_f(_|$)").unwrap();
    static ref FLOOR_RE: Regex = Regex::new(r"(?i)(\w)_?(\d+)_+f(_|$)").unwrap();
    static ref BUILDING_FLOOR_RE: Regex = Regex::new(
        r"(?i)(tower|building|floor|level|gym|center|house|cave|tunnel|path|mansion)_(\d+)(_|$)"
    )
    .unwrap();
    static ref SIDE_RE: Regex = Regex::new(r"(?i)(\w)_(\d+)_(\w+)_side(_|$)").unwrap();
    static ref UNDERSCORES_RE: Regex = Regex::new(r"_+").unwrap();

    /// Known aliases, keyed by compacted spelling. Covers renamed constants,
    /// abbreviations and misspellings carried over from the original games.
    static ref SPECIAL_CASES: HashMap<&'static str, &'static str> = {
        let entries: &[(&str, &str)] = &[
            // Status healers
            ("paralyzeheal", "parlyzheal"),
            ("paralyzheal", "parlyzheal"),
            ("parlyzcure", "parlyzheal"),
            ("burnhealer", "burnheal"),
            ("iceheal", "iceheal"),
            ("freezeheal", "iceheal"),
            ("awaken", "awakening"),
            ("fullheals", "fullheal"),
            // Battle items
            ("xspecial", "xspatk"),
            ("xspcl", "xspatk"),
            ("xspclatk", "xspatk"),
            ("xspecialattack", "xspatk"),
            ("xspcldef", "xspdef"),
            ("xspecialdefense", "xspdef"),
            ("xdefense", "xdefend"),
            ("xdef", "xdefend"),
            ("xatk", "xattack"),
            ("xspd", "xspeed"),
            ("xacc", "xaccuracy"),
            ("guardspecial", "guardspec"),
            // PP restorers
            ("elixer", "elixir"),
            ("maxelixer", "maxelixir"),
            ("ppmaximum", "ppmax"),
            // Held items
            ("blackbelti", "blackbelt"),
            ("blackglass", "blackglasses"),
            ("brightpowder", "brightpowder"),
            ("nevermelt", "nevermeltice"),
            ("twistspoon", "twistedspoon"),
            ("kingrock", "kingsrock"),
            ("polkadotbow", "pinkbow"),
            ("silkscarf", "silkscarf"),
            ("dragonscale", "dragonscale"),
            ("upgraded", "upgrade"),
            ("metalcoating", "metalcoat"),
            ("luckyegg", "luckyegg"),
            ("expshare", "expshare"),
            ("experienceshare", "expshare"),
            // Berries renamed between generations
            ("psncureberry", "psncureberry"),
            ("przcureberry", "przcureberry"),
            ("mintberry", "mintberry"),
            ("burntberry", "burntberry"),
            ("miracleberry", "miracleberry"),
            ("mysteryberry", "mysteryberry"),
            ("goldberry", "goldberry"),
            // Evolution stones
            ("thunderstone", "thunderstone"),
            ("thundersstone", "thunderstone"),
            ("waterstones", "waterstone"),
            ("firestones", "firestone"),
            ("leafstones", "leafstone"),
            // Recovery
            ("energypowder", "energypowder"),
            ("energypowdr", "energypowder"),
            ("revivalherbs", "revivalherb"),
            ("reviveherb", "revivalherb"),
            ("moomoo", "moomoomilk"),
            ("ragecandy", "ragecandybar"),
            ("freshh2o", "freshwater"),
            // Key items
            ("pokegear", "pokegear"),
            ("pkmngear", "pokegear"),
            ("sssticket", "ssticket"),
            ("ssaqua", "ssticket"),
            ("itemfind", "itemfinder"),
            ("coincases", "coincase"),
            ("silphscope2", "silphscope"),
            ("cardkeys", "cardkey"),
            ("mysteryegg", "mysteryegg"),
            // Mail
            ("litebluemail", "litebluemail"),
            ("lightbluemail", "litebluemail"),
            ("portraitmail", "portraitmail"),
            ("portrait", "portraitmail"),
            ("blueskymail", "blueskymail"),
            ("lovelymail", "lovelymail"),
            ("flowermail", "flowermail"),
            ("surfmail", "surfmail"),
            ("eonmail", "eonmail"),
            ("morphmail", "morphmail"),
            ("musicmail", "musicmail"),
            ("miragemail", "miragemail"),
        ];
        entries.iter().copied().collect()
    };

    /// Ball short forms. Description labels drop the "Ball" suffix, so the
    /// full spelling collapses to the short form everywhere.
    static ref SHORT_FORMS: HashMap<&'static str, &'static str> = {
        let entries: &[(&str, &str)] = &[
            ("pokeball", "poke"),
            ("greatball", "great"),
            ("ultraball", "ultra"),
            ("masterball", "master"),
            ("safariball", "safari"),
            ("levelball", "level"),
            ("lureball", "lure"),
            ("moonball", "moon"),
            ("friendball", "friend"),
            ("loveball", "love"),
            ("heavyball", "heavy"),
            ("fastball", "fast"),
            ("sportball", "sport"),
            ("parkball", "park"),
            ("repeatball", "repeat"),
            ("timerball", "timer"),
            ("nestball", "nest"),
            ("netball", "net"),
            ("diveball", "dive"),
            ("luxuryball", "luxury"),
            ("healball", "heal"),
            ("quickball", "quick"),
            ("duskball", "dusk"),
            ("dreamball", "dream"),
            ("premierball", "premier"),
            ("cherishball", "cherish"),
        ];
        entries.iter().copied().collect()
    };
}

/// Return the canonical key for an item identifier.
///
/// Accepts constants (`TM_EARTHQUAKE`), labels (`PokeBallDesc`), directives
/// (`db Full Heal`) and display names (`Poké Ball`). Input that is already
/// lower-case is passed through with `_` turned into `-`, so callers must
/// tolerate keys that match nothing. Idempotent.
pub fn normalize_id(raw: &str) -> String {
    let stripped = strip_label(raw);

    let key = if let Some(caps) = TM_HM_RE.captures(stripped) {
        format!("{}{}", caps[1].to_ascii_lowercase(), compact(&caps[2]))
    } else if stripped
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        stripped.replace('_', "-")
    } else {
        compact(stripped)
    };

    let key = SPECIAL_CASES.get(key.as_str()).map_or(key, |alias| alias.to_string());
    SHORT_FORMS.get(key.as_str()).map_or(key, |short| short.to_string())
}

/// Strip directives, quotes, trailing colons and the `Desc` label suffix.
fn strip_label(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(m) = DIRECTIVE_RE.find(s) {
        s = &s[m.end()..];
    }
    s = s.trim_end_matches(':').trim_matches('"').trim();
    for suffix in ["Description", "Desc"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    s
}

/// Lower-case and keep only ASCII letters and digits, folding accents and
/// gender symbols first.
fn compact(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .filter_map(|c| match c {
            'é' | 'è' | 'ê' => Some('e'),
            '♂' => Some('m'),
            '♀' => Some('f'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}

/// Reduce a string to its simplest comparable form: lower-case with spaces,
/// underscores, dashes, apostrophes, periods and angle brackets removed.
pub fn reduce(s: &str) -> String {
    s.to_lowercase()
        .replace(['♂'], "m")
        .replace(['♀'], "f")
        .replace('é', "e")
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '\'' | '.' | '<' | '>'))
        .collect()
}

/// Insert spaces at case boundaries: `FullHeal` → `Full Heal`, `HPUp` → `HP Up`.
pub fn split_case_boundaries(s: &str) -> String {
    let spaced = LOWER_UPPER_RE.replace_all(s, "${1} ${2}");
    ACRONYM_RE.replace_all(&spaced, "${1} ${2}").into_owned()
}

/// Upper-case the first letter of each word and lower-case the rest.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display name for an item label or constant: `PokeBallDesc` → `Poké Ball`,
/// `FULL_HEAL` → `Full Heal`.
pub fn format_item_name(raw: &str) -> String {
    let stripped = strip_label(raw);
    let name = if CONSTANT_RE.is_match(stripped) {
        title_case(&stripped.replace('_', " "))
    } else {
        split_case_boundaries(stripped).replace('_', " ")
    };
    name.replace("Poke", "Poké")
}

/// Canonical location key: `BurnedTowerB1F` → `burned_tower_b_1f`,
/// `Route30` → `route_30`, `Goldenrod City` → `goldenrod_city`.
pub fn normalize_location_key(input: &str) -> String {
    let key = LOWER_UPPER_RE.replace_all(input.trim(), "${1}_${2}");
    let key = ACRONYM_RE.replace_all(&key, "${1}_${2}").to_lowercase();
    let key = ROUTE_KEY_RE.replace_all(&key, "route_${1}${2}");
    let key = SEPARATOR_RE.replace_all(&key, "_");
    let key = BASEMENT_RE.replace_all(&key, "_b_${1}f${2}");
    let key = FLOOR_RE.replace_all(&key, "${1}_${2}f${3}");
    let key = BUILDING_FLOOR_RE.replace_all(&key, "${1}_${2}f${3}");
    let key = SIDE_RE.replace_all(&key, "${1}_${2}f_${3}_side${4}");
    let key = UNDERSCORES_RE.replace_all(&key, "_");
    key.trim_matches('_').to_string()
}

/// Human-readable name for a normalized location key: `route_30` →
/// `Route 30`, `burned_tower_b_1f` → `Burned Tower B1F`.
pub fn location_key_display(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut parts = key.split('_').filter(|w| !w.is_empty()).peekable();
    while let Some(word) = parts.next() {
        let is_floor = |w: &str| w.len() > 1 && w.ends_with('f') && w[..w.len() - 1].chars().all(|c| c.is_ascii_digit());
        if word == "b" && parts.peek().is_some_and(|next| is_floor(*next)) {
            let floor = parts.next().unwrap_or_default();
            words.push(format!("B{}", floor.to_uppercase()));
        } else if is_floor(word) {
            words.push(word.to_uppercase());
        } else {
            words.push(title_case(word));
        }
    }
    words.join(" ")
}

/// Canonical species constant: lower-case, hyphens and spaces to underscores.
pub fn canonical_species(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Canonical move constant, same convention as species.
pub fn canonical_move(raw: &str) -> String {
    canonical_species(raw)
}

/// Form constant to a compact form key: `ALOLAN_FORM` → `alolan`,
/// `PIKACHU_SURF_FORM` → `surf`.
pub fn parse_form(raw: &str) -> String {
    let form = raw.trim().trim_end_matches("_FORM");
    let form = ["TAUROS_", "MAGIKARP_", "PIKACHU_", "MEWTWO_", "ARBOK_", "UNOWN_"]
        .iter()
        .find_map(|prefix| form.strip_prefix(prefix))
        .unwrap_or(form);
    reduce(form)
}
