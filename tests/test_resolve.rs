//! Resolution behaviour over real files in scratch directories.

use std::fs;
use std::path::{Path, PathBuf};

use metaconf::resolver::{
    BindingKey, OverridePolicy, Reference, ResolveError, Resolver, Value, resolve,
};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn no_search_paths() -> Vec<PathBuf> {
    Vec::new()
}

#[test]
fn file_without_includes_yields_exactly_its_bindings() {
    let dir = TempDir::new().unwrap();
    let root = write(
        dir.path(),
        "sampler.gin",
        "EpisodeDescriptionSampler.min_ways = 5\n\
         EpisodeDescriptionSampler.max_ways_upper_bound = 50\n",
    );

    let cfg = resolve(&root, no_search_paths()).unwrap();

    let all: Vec<(String, Value)> = cfg.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    assert_eq!(
        all,
        vec![
            (
                "EpisodeDescriptionSampler.max_ways_upper_bound".to_string(),
                Value::Int(50)
            ),
            ("EpisodeDescriptionSampler.min_ways".to_string(), Value::Int(5)),
        ]
    );
    assert_eq!(cfg.sources(), [root]);
}

#[test]
fn including_file_overrides_included_value() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.gin", "LearnerConfig.learning_rate = 0.1\n");
    let a = write(
        dir.path(),
        "a.gin",
        "include 'b.gin'\nLearnerConfig.learning_rate = 0.002\n",
    );

    let cfg = resolve(&a, no_search_paths()).unwrap();
    assert_eq!(
        cfg.get("LearnerConfig", "learning_rate"),
        Some(&Value::Float(0.002))
    );
    assert_eq!(cfg.len(), 1);
}

#[test]
fn including_file_wins_even_when_binding_precedes_include() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.gin", "LearnerConfig.learning_rate = 0.1\n");
    let a = write(
        dir.path(),
        "a.gin",
        "LearnerConfig.learning_rate = 0.002\ninclude 'b.gin'\n",
    );

    let cfg = resolve(&a, no_search_paths()).unwrap();
    assert_eq!(
        cfg.get("LearnerConfig", "learning_rate"),
        Some(&Value::Float(0.002))
    );
    let origin = cfg
        .origin(&BindingKey::new("LearnerConfig", "learning_rate"))
        .unwrap();
    assert_eq!(origin.file, a);
    assert_eq!(origin.line, 1);
}

#[test]
fn includes_interleaved_with_bindings_all_apply_first() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.gin", "X.v = 'b'\nX.from_b = 1\n");
    write(dir.path(), "c.gin", "X.v = 'c'\nX.w = 'c'\n");
    let a = write(
        dir.path(),
        "a.gin",
        "include 'b.gin'\nX.v = 'a'\ninclude 'c.gin'\n",
    );

    let cfg = resolve(&a, no_search_paths()).unwrap();
    assert_eq!(cfg.get("X", "v"), Some(&Value::Str("a".into())));
    assert_eq!(cfg.get("X", "w"), Some(&Value::Str("c".into())));
    assert_eq!(cfg.get("X", "from_b"), Some(&Value::Int(1)));
}

#[test]
fn includes_apply_depth_first_in_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "c.gin", "X.v = 'c'\nX.from_c = 1\n");
    write(dir.path(), "b.gin", "include 'c.gin'\nX.v = 'b'\n");
    write(dir.path(), "d.gin", "X.v = 'd'\n");
    let a = write(dir.path(), "a.gin", "include 'b.gin'\ninclude 'd.gin'\n");

    let cfg = resolve(&a, no_search_paths()).unwrap();
    assert_eq!(cfg.get("X", "v"), Some(&Value::Str("d".into())));
    assert_eq!(cfg.get("X", "from_c"), Some(&Value::Int(1)));
    let names: Vec<_> = cfg
        .sources()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.gin", "b.gin", "c.gin", "d.gin"]);
}

#[test]
fn direct_self_include_is_a_cycle() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.gin", "X.v = 1\ninclude 'a.gin'\n");

    let err = resolve(&a, no_search_paths()).unwrap_err();
    match err {
        ResolveError::CyclicInclude { chain } => assert_eq!(chain.len(), 2),
        other => panic!("expected CyclicInclude, got {other}"),
    }
}

#[test]
fn transitive_self_include_is_a_cycle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.gin", "include 'c.gin'\n");
    write(dir.path(), "c.gin", "include 'a.gin'\n");
    let a = write(dir.path(), "a.gin", "include 'b.gin'\n");

    let err = resolve(&a, no_search_paths()).unwrap_err();
    match err {
        ResolveError::CyclicInclude { chain } => {
            assert_eq!(chain.len(), 4);
            assert_eq!(chain.first(), chain.last());
        }
        other => panic!("expected CyclicInclude, got {other}"),
    }
}

#[test]
fn diamond_include_is_not_a_cycle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.gin", "X.shared = 1\n");
    write(dir.path(), "left.gin", "include 'common.gin'\nX.left = 1\n");
    write(dir.path(), "right.gin", "include 'common.gin'\nX.right = 1\n");
    let root = write(
        dir.path(),
        "root.gin",
        "include 'left.gin'\ninclude 'right.gin'\n",
    );

    let cfg = resolve(&root, no_search_paths()).unwrap();
    assert_eq!(cfg.len(), 3);
}

#[test]
fn diamond_reapplies_shared_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.gin", "X.v = 'common'\n");
    write(dir.path(), "left.gin", "include 'common.gin'\n");
    write(dir.path(), "right.gin", "X.v = 'right'\n");
    let root = write(
        dir.path(),
        "root.gin",
        "include 'right.gin'\ninclude 'left.gin'\n",
    );

    let cfg = resolve(&root, no_search_paths()).unwrap();
    assert_eq!(cfg.get("X", "v"), Some(&Value::Str("common".into())));
}

#[test]
fn missing_include_fails_with_missing_file() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.gin", "include 'setups/nope.gin'\n");

    let err = resolve(&a, [dir.path().join("gin")]).unwrap_err();
    match err {
        ResolveError::MissingFile { path, searched } => {
            assert_eq!(path, PathBuf::from("setups/nope.gin"));
            assert_eq!(searched, vec![dir.path().to_path_buf(), dir.path().join("gin")]);
        }
        other => panic!("expected MissingFile, got {other}"),
    }
}

#[test]
fn missing_root_fails_with_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = resolve(dir.path().join("absent.gin"), no_search_paths()).unwrap_err();
    assert!(matches!(err, ResolveError::MissingFile { .. }));
}

#[test]
fn includes_fall_back_to_search_paths() {
    let dir = TempDir::new().unwrap();
    let gin = dir.path().join("gin");
    write(&gin, "setups/base.gin", "X.v = 1\n");
    let root = write(dir.path(), "exp/run.gin", "include 'setups/base.gin'\n");

    let cfg = resolve(&root, [gin]).unwrap();
    assert_eq!(cfg.get("X", "v"), Some(&Value::Int(1)));
}

#[test]
fn includes_prefer_the_including_files_directory() {
    let dir = TempDir::new().unwrap();
    let gin = dir.path().join("gin");
    write(&gin, "base.gin", "X.v = 'search path'\n");
    write(dir.path(), "exp/base.gin", "X.v = 'sibling'\n");
    let root = write(dir.path(), "exp/run.gin", "include 'base.gin'\n");

    let cfg = resolve(&root, [gin]).unwrap();
    assert_eq!(cfg.get("X", "v"), Some(&Value::Str("sibling".into())));
}

#[test]
fn root_is_found_on_search_path() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "learners/proto.gin", "X.v = 1\n");

    let cfg = resolve("learners/proto.gin", [dir.path()]).unwrap();
    assert_eq!(cfg.get("X", "v"), Some(&Value::Int(1)));
}

#[test]
fn malformed_line_in_included_file_names_that_file() {
    let dir = TempDir::new().unwrap();
    let bad = write(dir.path(), "bad.gin", "X.v = 1\nX.w 2\n");
    let root = write(dir.path(), "root.gin", "include 'bad.gin'\n");

    match resolve(&root, no_search_paths()).unwrap_err() {
        ResolveError::MalformedBinding { file, line, .. } => {
            assert_eq!(file, bad);
            assert_eq!(line, 2);
        }
        other => panic!("expected MalformedBinding, got {other}"),
    }
}

#[test]
fn strict_policy_flags_override_across_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.gin", "LearnerConfig.learning_rate = 0.1\n");
    let a = write(
        dir.path(),
        "a.gin",
        "include 'b.gin'\nLearnerConfig.learning_rate = 0.002\n",
    );

    let err = Resolver::new(no_search_paths())
        .with_policy(OverridePolicy::RejectDuplicates)
        .resolve(&a)
        .unwrap_err();
    match err {
        ResolveError::DuplicateScopeConflict { key, first, second } => {
            assert_eq!(key, BindingKey::new("LearnerConfig", "learning_rate"));
            assert!(first.file.ends_with("b.gin"));
            assert!(second.file.ends_with("a.gin"));
        }
        other => panic!("expected DuplicateScopeConflict, got {other}"),
    }
}

#[test]
fn resolving_twice_is_identical() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "b.gin",
        "Trainer.datasets = ['a', 'b']\nweight_decay = 1e-4\nX.wd = %weight_decay\n",
    );
    let a = write(
        dir.path(),
        "a.gin",
        "include 'b.gin'\nTrainer.aug = @SupportSetDataAugmentation()\n",
    );

    let first = resolve(&a, no_search_paths()).unwrap();
    let second = resolve(&a, no_search_paths()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_config_string(), second.to_config_string());
}

#[test]
fn equal_references_compare_equal() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "b.gin",
        "Trainer.support_set_augmentation = @SupportSetDataAugmentation()\n",
    );
    let a = write(
        dir.path(),
        "a.gin",
        "include 'b.gin'\nEvaluator.augmentation = @SupportSetDataAugmentation()\n",
    );

    let cfg = resolve(&a, no_search_paths()).unwrap();
    let left = cfg
        .get_as::<Reference>("Trainer", "support_set_augmentation")
        .unwrap()
        .unwrap();
    let right = cfg
        .get_as::<Reference>("Evaluator", "augmentation")
        .unwrap()
        .unwrap();
    assert_eq!(left, right);
    assert_eq!(left, Reference::new("SupportSetDataAugmentation", true));
    assert_ne!(left, Reference::new("SupportSetDataAugmentation", false));
}

#[test]
fn extra_bindings_can_include_from_search_paths() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "extra.gin", "X.extra = 1\n");
    let root = write(dir.path(), "root.gin", "X.v = 1\n");

    let cfg = Resolver::new([dir.path()])
        .with_bindings(["include 'extra.gin'", "X.v = 2"])
        .resolve(&root)
        .unwrap();
    assert_eq!(cfg.get("X", "extra"), Some(&Value::Int(1)));
    assert_eq!(cfg.get("X", "v"), Some(&Value::Int(2)));
}

#[test]
fn extra_binding_above_its_include_still_wins() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "extra.gin", "X.v = 1\n");
    let root = write(dir.path(), "root.gin", "X.v = 0\n");

    let cfg = Resolver::new([dir.path()])
        .with_bindings(["X.v = 2", "include 'extra.gin'"])
        .resolve(&root)
        .unwrap();
    assert_eq!(cfg.get("X", "v"), Some(&Value::Int(2)));
}
