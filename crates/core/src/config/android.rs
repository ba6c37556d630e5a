//! Android application build-variant preset
//!
//! Schema and base fragment for the LunaTrack Android app module. Keys mirror
//! the Gradle blocks of `android/app/build.gradle.kts`, flattened with dots.

use super::fragment::ConfigFragment;
use super::schema::{Schema, SchemaEntry};
use crate::error::Result;

/// Lowest API level the toolchain still supports
pub const MIN_SUPPORTED_SDK: i64 = 21;

/// Newest API level known to this preset
pub const MAX_KNOWN_SDK: i64 = 35;

/// Application id / namespace shape: dotted lowercase Java package
const PACKAGE_PATTERN: &str = r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)+$";

const JAVA_VERSIONS: [&str; 4] = ["VERSION_1_8", "VERSION_11", "VERSION_17", "VERSION_21"];
const JVM_TARGETS: [&str; 4] = ["1.8", "11", "17", "21"];

fn sdk_level() -> SchemaEntry {
    SchemaEntry::integer().range(Some(MIN_SUPPORTED_SDK), Some(MAX_KNOWN_SDK))
}

/// Schema for the Android app module
pub fn android_schema() -> Result<Schema> {
    let schema = Schema::new()
        .with_key(
            "namespace",
            SchemaEntry::string()
                .pattern(PACKAGE_PATTERN)?
                .describe("Kotlin/Java namespace for generated R and BuildConfig classes"),
        )
        .with_key(
            "compileSdk",
            sdk_level().describe("API level the app is compiled against"),
        )
        .with_key(
            "defaultConfig.applicationId",
            SchemaEntry::string()
                .pattern(PACKAGE_PATTERN)?
                .describe("Package name published to the store"),
        )
        .with_key(
            "defaultConfig.minSdk",
            sdk_level().describe("Lowest API level the app installs on"),
        )
        .with_key(
            "defaultConfig.targetSdk",
            sdk_level().describe("API level the app is tested against"),
        )
        .with_key(
            "defaultConfig.versionCode",
            SchemaEntry::integer()
                .range(Some(1), Some(2_100_000_000))
                .describe("Monotonic store version code"),
        )
        .with_key(
            "defaultConfig.versionName",
            SchemaEntry::string().describe("User-visible version string"),
        )
        .with_key(
            "compileOptions.sourceCompatibility",
            SchemaEntry::string()
                .one_of(JAVA_VERSIONS)
                .describe("Java language level of sources"),
        )
        .with_key(
            "compileOptions.targetCompatibility",
            SchemaEntry::string()
                .one_of(JAVA_VERSIONS)
                .describe("Java bytecode level"),
        )
        .with_key(
            "compileOptions.isCoreLibraryDesugaringEnabled",
            SchemaEntry::boolean().describe("Backport java.time and friends to older API levels"),
        )
        .with_key(
            "kotlinOptions.jvmTarget",
            SchemaEntry::string()
                .one_of(JVM_TARGETS)
                .describe("Kotlin JVM bytecode target"),
        )
        .with_key(
            "buildTypes.release.isMinifyEnabled",
            SchemaEntry::boolean().describe("R8 code shrinking for release"),
        )
        .with_key(
            "buildTypes.release.isShrinkResources",
            SchemaEntry::boolean().describe("Strip unused resources for release"),
        )
        .with_key(
            "flutter.source",
            SchemaEntry::string().describe("Path to the Flutter module root"),
        );

    schema.validate()?;
    Ok(schema)
}

/// Base fragment carrying the app module's checked-in settings
#[must_use]
pub fn android_defaults() -> ConfigFragment {
    ConfigFragment::builder("android-defaults")
        .set("namespace", "com.periodtracking.lunatrack.luna_track")
        .set("compileSdk", 35)
        .set(
            "defaultConfig.applicationId",
            "com.periodtracking.lunatrack.luna_track",
        )
        .set("defaultConfig.minSdk", 23)
        .set("defaultConfig.targetSdk", 35)
        .set("defaultConfig.versionCode", 1)
        .set("defaultConfig.versionName", "1.0")
        .set("compileOptions.sourceCompatibility", "VERSION_17")
        .set("compileOptions.targetCompatibility", "VERSION_17")
        .set("compileOptions.isCoreLibraryDesugaringEnabled", true)
        .set("kotlinOptions.jvmTarget", "17")
        .set("buildTypes.release.isMinifyEnabled", true)
        .set("buildTypes.release.isShrinkResources", true)
        .set("flutter.source", "../..")
        .build()
}
