pub const UNKNOWN_TITLE: &str = "Unknown";

/// Level titles keyed by the 8-byte header tag and the variant word beside
/// it. Covers the retail channels; anything else reports as unknown.
const LEVEL_TITLES: &[(&[u8; 8], u32, &str)] = &[
	(b"TOONTV\0\0", 0, "Out of Toon"),
	(b"TOONTV\0\0", 1, "Fine Tooning"),
	(b"HORROR\0\0", 0, "Smellraiser"),
	(b"HORROR\0\0", 1, "Frankensteinfeld"),
	(b"KUNGFU\0\0", 0, "Mooshoo Pork"),
	(b"KUNGFU\0\0", 1, "Samurai Night Fever"),
	(b"SCIFI\0\0\0", 0, "Pain in the Asteroids"),
	(b"SCIFI\0\0\0", 1, "Trouble in Uranus"),
	(b"REZOPOLI", 0, "Rezopolis"),
	(b"GILLIGEX", 0, "Gilligex Isle"),
];

pub fn level_title(tag: &[u8; 8], variant: u32) -> &'static str {
	LEVEL_TITLES
		.iter()
		.find(|&&(t, v, _)| t == tag && v == variant)
		.map(|&(.., title)| title)
		.unwrap_or(UNKNOWN_TITLE)
}
