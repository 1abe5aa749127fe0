use crate::models::ModLoader;

// Tuning policy per Java major version. GC choice and pre-touch differ per bucket.
const JAVA_8_FLAGS: &[&str] = &[
    "-XX:+UseG1GC",
    "-XX:G1NewSizePercent=30",
    "-XX:G1MaxNewSizePercent=40",
    "-XX:G1HeapRegionSize=16M",
    "-XX:G1ReservePercent=20",
    "-XX:MaxGCPauseMillis=50",
    "-XX:G1HeapWastePercent=5",
    "-XX:G1MixedGCCountTarget=4",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+PerfDisableSharedMem",
    "-XX:+AlwaysPreTouch",
];

const JAVA_17_FLAGS: &[&str] = &[
    "-XX:+UseZGC",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+DisableExplicitGC",
    "-XX:+AlwaysPreTouch",
];

const JAVA_21_FLAGS: &[&str] = &[
    "--enable-preview",
    "-XX:+UseZGC",
    "-XX:+UnlockExperimentalVMOptions",
    "-XX:+DisableExplicitGC",
    "-XX:+AlwaysPreTouch",
];

const KNOWN_JAVA_MAJORS: [u32; 3] = [8, 17, 21];

/// Java major version the given game version runs on.
pub fn java_major_for_version(version: &str) -> u32 {
    let mut parts = version.trim().split('.');
    let major = parts.next().and_then(|p| p.parse::<u32>().ok());
    let minor = parts.next().and_then(|p| p.parse::<u32>().ok());

    match (major, minor) {
        (Some(1), Some(minor)) if (8..=16).contains(&minor) => 8,
        (Some(1), Some(minor)) if (17..=19).contains(&minor) => 17,
        (Some(1), Some(minor)) if minor >= 20 => 21,
        _ => 8,
    }
}

pub fn flags_for_java(java_major: u32) -> &'static [&'static str] {
    match java_major {
        8 => JAVA_8_FLAGS,
        17 => JAVA_17_FLAGS,
        21 => JAVA_21_FLAGS,
        _ => &[],
    }
}

/// Recommended JVM flags for a selection. Mod loaders manage their own
/// tuning, so only vanilla gets a recommendation.
pub fn recommend(version: &str, modloader: ModLoader) -> Vec<String> {
    if !modloader.is_vanilla() {
        return Vec::new();
    }
    flags_for_java(java_major_for_version(version))
        .iter()
        .map(|flag| flag.to_string())
        .collect()
}

pub fn is_recommended_set(flags: &[String]) -> bool {
    KNOWN_JAVA_MAJORS.iter().any(|major| {
        let set = flags_for_java(*major);
        set.len() == flags.len() && set.iter().zip(flags).all(|(a, b)| *a == b.as_str())
    })
}

/// Flags to keep after the selected version changes. Untouched
/// recommendations follow the new selection; custom flags are left alone.
pub fn reconcile_flags(current: &[String], version: &str, modloader: ModLoader) -> Vec<String> {
    if is_recommended_set(current) {
        recommend(version, modloader)
    } else {
        current.to_vec()
    }
}

pub fn parse_flags(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_versions_by_minor() {
        assert_eq!(java_major_for_version("1.8.9"), 8);
        assert_eq!(java_major_for_version("1.16.5"), 8);
        assert_eq!(java_major_for_version("1.17"), 17);
        assert_eq!(java_major_for_version("1.19.4"), 17);
        assert_eq!(java_major_for_version("1.20.4"), 21);
        assert_eq!(java_major_for_version("1.21"), 21);
    }

    #[test]
    fn unparseable_versions_fall_back_to_java_8() {
        assert_eq!(java_major_for_version("2.0"), 8);
        assert_eq!(java_major_for_version("24w14a"), 8);
        assert_eq!(java_major_for_version(""), 8);
        assert_eq!(java_major_for_version("1.7.10"), 8);
    }

    #[test]
    fn vanilla_gets_bucket_flags() {
        let flags = recommend("1.16.5", ModLoader::Vanilla);
        assert_eq!(flags.first().map(String::as_str), Some("-XX:+UseG1GC"));
        assert_eq!(flags.len(), JAVA_8_FLAGS.len());
        assert_eq!(recommend("2.0", ModLoader::Vanilla), flags);
        assert_eq!(recommend("1.21", ModLoader::Vanilla)[0], "--enable-preview");
    }

    #[test]
    fn mod_loaders_get_no_recommendation() {
        assert!(recommend("1.21", ModLoader::Fabric).is_empty());
        assert!(recommend("1.12.2", ModLoader::Forge).is_empty());
        assert!(recommend("1.20.1", ModLoader::Quilt).is_empty());
    }

    #[test]
    fn unknown_bucket_is_empty() {
        assert!(flags_for_java(11).is_empty());
    }

    #[test]
    fn reconcile_swaps_untouched_recommendations() {
        let java8 = recommend("1.16.5", ModLoader::Vanilla);
        assert_eq!(
            reconcile_flags(&java8, "1.20.4", ModLoader::Vanilla),
            recommend("1.20.4", ModLoader::Vanilla)
        );
        assert!(reconcile_flags(&java8, "1.20.4", ModLoader::Fabric).is_empty());
    }

    #[test]
    fn reconcile_keeps_custom_flags() {
        let custom = parse_flags("-Xss4M  -XX:+UseG1GC");
        assert_eq!(custom, vec!["-Xss4M", "-XX:+UseG1GC"]);
        assert_eq!(reconcile_flags(&custom, "1.21", ModLoader::Vanilla), custom);
    }
}
