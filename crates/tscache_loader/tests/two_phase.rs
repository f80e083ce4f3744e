use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tscache_cache::{CacheEntry, CacheError, CacheStore, JsonFileStore};
use tscache_common::Mtime;
use tscache_config::{LoaderOptions, DEFAULT_CACHE_DIRECTORY, LOADER_NAME};
use tscache_loader::{Loader, LoaderError, PitchOutcome, RequestData};
use tscache_testing::{init_tracing, write_file, FakeCompiler, FakeLinter, RecordingContext};

const PAST: u64 = 1_600_000_000_000;

struct Project {
    dir: tempfile::TempDir,
    loader_js: PathBuf,
}

impl Project {
    fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tsconfig.json"),
            r#"{ "compilerOptions": { "strict": true } }"#,
        )
        .unwrap();
        let loader_js = dir.path().join("tscache-loader.js");
        write_file(&loader_js, "module.exports = {}", Mtime::from_millis(PAST));
        Self { dir, loader_js }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn source(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        write_file(&path, content, Mtime::from_millis(PAST));
        path
    }

    fn loader(&self, compiler: &FakeCompiler, options: Value) -> Loader {
        let options = LoaderOptions::from_json(options, LOADER_NAME).unwrap();
        Loader::builder(Arc::new(compiler.clone()), options)
            .cwd(self.dir.path())
            .linter(Arc::new(FakeLinter))
            .build()
            .unwrap()
    }

    fn context(&self, resource: &Path) -> RecordingContext {
        RecordingContext::new(resource).with_loader(&self.loader_js)
    }

    fn cache_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.path(DEFAULT_CACHE_DIRECTORY)) else {
            return Vec::new();
        };
        entries
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }
}

fn request(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn scenario_a_clean_file_compiles_without_diagnostics() {
    let project = Project::new();
    let file = project.source("a.ts", "const x: number = 1");
    let compiler = FakeCompiler::new();
    let loader = project.loader(&compiler, json!({}));
    let mut ctx = project.context(&file);

    let output = loader
        .load(&mut ctx, &request(&file), "const x: number = 1")
        .unwrap();

    assert!(output.content.contains("const x = 1"));
    assert!(ctx.errors.is_empty());
    assert!(ctx.warnings.is_empty());
    assert_eq!(ctx.cacheable, Some(true));
    assert_eq!(output.source_map.file, request(&file));
    assert_eq!(output.source_map.sources, vec![request(&file)]);

    let session = loader.session().unwrap().lock();
    let entry = session.registry().get(&request(&file)).unwrap();
    assert_eq!(entry.version, 2);
    assert!(entry.diagnostics.is_empty());
    assert!(!entry.emitted, "output is released once handed to the host");
}

#[test]
fn scenario_b_type_error_is_reported_at_the_assignment() {
    let project = Project::new();
    let file = project.source("b.ts", "const x: number = 'oops'");
    let compiler = FakeCompiler::new();
    let loader = project.loader(&compiler, json!({}));
    let mut ctx = project.context(&file);

    loader
        .load(&mut ctx, &request(&file), "const x: number = 'oops'")
        .unwrap();

    assert_eq!(
        ctx.errors,
        vec!["(0,6): Type 'string' is not assignable to type 'number'.".to_string()]
    );
    assert!(ctx.warnings.is_empty());
}

#[test]
fn scenario_c_unchanged_request_is_served_from_cache() {
    let project = Project::new();
    let source = "const c: number = 'bad'";
    let file = project.source("c.ts", source);
    let src_dir = project.path("src");
    std::fs::create_dir(&src_dir).unwrap();
    tscache_testing::set_mtime(&src_dir, Mtime::from_millis(PAST));
    let compiler = FakeCompiler::new();
    let counters = compiler.counters();
    let loader = project.loader(&compiler, json!({ "cache": true }));
    assert!(loader.cache_enabled());

    let mut first_ctx = project.context(&file).with_context_dependency(&src_dir);
    let first = loader.load(&mut first_ctx, &request(&file), source).unwrap();
    loader.wait_for_writes();
    assert_eq!(project.cache_files().len(), 1);
    assert_eq!(counters.compiles(), 1);

    let mut second_ctx = RecordingContext::new(&file);
    let mut data = RequestData::new();
    let outcome = loader.pitch(&mut second_ctx, &request(&file), &mut data);

    let PitchOutcome::Cached(second) = outcome else {
        panic!("expected a cache hit, got {outcome:?}");
    };
    assert_eq!(second, first);
    assert_eq!(second_ctx.errors, first_ctx.errors);
    assert_eq!(second_ctx.errors.len(), 1);
    assert_eq!(counters.compiles(), 1);
    assert_eq!(counters.checks(), 1);
    assert!(data.start_time.is_none());
    assert!(second_ctx.dependencies.contains(&project.loader_js));
    assert_eq!(second_ctx.context_dependencies, vec![src_dir]);
    assert!(second_ctx.warnings.is_empty());
}

#[test]
fn cache_hit_replays_each_diagnostic_with_its_severity() {
    let project = Project::new();
    std::fs::write(project.path("tslint.json"), "{}").unwrap();
    let source = "console.log(1)\nconst w: number = 'bad'";
    let file = project.source("w.ts", source);
    let compiler = FakeCompiler::new();
    let loader = project.loader(
        &compiler,
        json!({ "cache": true, "tslint": "tslint.json" }),
    );

    let mut first_ctx = project.context(&file);
    loader.load(&mut first_ctx, &request(&file), source).unwrap();
    loader.wait_for_writes();
    assert_eq!(
        first_ctx.errors,
        vec!["(1,6): Type 'string' is not assignable to type 'number'.".to_string()]
    );
    assert_eq!(
        first_ctx.warnings,
        vec!["(0,0): Calls to 'console.log' are not allowed.".to_string()]
    );

    let mut second_ctx = RecordingContext::new(&file);
    let mut data = RequestData::new();
    assert!(matches!(
        loader.pitch(&mut second_ctx, &request(&file), &mut data),
        PitchOutcome::Cached(_)
    ));
    assert_eq!(second_ctx.errors, first_ctx.errors);
    assert_eq!(second_ctx.warnings, first_ctx.warnings);
    assert_eq!(compiler.counters().compiles(), 1);
}

#[test]
fn scenario_d_touched_dependency_forces_recompile() {
    let project = Project::new();
    let source = "import { dep } from './dep'\nconst d: number = 1";
    let file = project.source("d.ts", source);
    let dep = project.source("dep.ts", "export const dep = 1");
    let compiler = FakeCompiler::new();
    let counters = compiler.counters();
    let loader = project.loader(&compiler, json!({ "cache": true }));

    let mut ctx = project.context(&file).with_dependency(&dep);
    loader.load(&mut ctx, &request(&file), source).unwrap();
    loader.wait_for_writes();
    assert_eq!(counters.compiles(), 1);

    write_file(&dep, "export const dep = 2", Mtime::from_millis(PAST + 1_000));

    let mut ctx = project.context(&file).with_dependency(&dep);
    let mut data = RequestData::new();
    assert_eq!(
        loader.pitch(&mut ctx, &request(&file), &mut data),
        PitchOutcome::Continue
    );
    assert!(data.start_time.is_some());
    let output = loader.run(&mut ctx, source, &data).unwrap();
    loader.wait_for_writes();
    assert!(output.content.contains("const d = 1"));
    assert_eq!(counters.compiles(), 2);

    // The fresh entry records the new mtime and is valid again.
    let mut ctx = project.context(&file).with_dependency(&dep);
    let mut data = RequestData::new();
    assert!(matches!(
        loader.pitch(&mut ctx, &request(&file), &mut data),
        PitchOutcome::Cached(_)
    ));
    assert_eq!(counters.compiles(), 2);
}

#[test]
fn deleted_dependency_is_a_miss() {
    let project = Project::new();
    let source = "let e = 1";
    let file = project.source("e.ts", source);
    let dep = project.source("gone.ts", "export {}");
    let compiler = FakeCompiler::new();
    let loader = project.loader(&compiler, json!({ "cache": true }));

    let mut ctx = project.context(&file).with_dependency(&dep);
    loader.load(&mut ctx, &request(&file), source).unwrap();
    loader.wait_for_writes();
    std::fs::remove_file(&dep).unwrap();

    let mut data = RequestData::new();
    let mut ctx = project.context(&file);
    assert_eq!(
        loader.pitch(&mut ctx, &request(&file), &mut data),
        PitchOutcome::Continue
    );
}

#[test]
fn recorded_entry_lists_loader_chain_and_context_dependencies() {
    let project = Project::new();
    let source = "let f = 1";
    let file = project.source("f.ts", source);
    let src_dir = project.path("src");
    std::fs::create_dir(&src_dir).unwrap();
    tscache_testing::set_mtime(&src_dir, Mtime::from_millis(PAST));
    let compiler = FakeCompiler::new();
    let loader = project.loader(&compiler, json!({ "cache": true }));

    let mut ctx = project.context(&file).with_context_dependency(&src_dir);
    loader.load(&mut ctx, &request(&file), source).unwrap();
    loader.wait_for_writes();

    let files = project.cache_files();
    assert_eq!(files.len(), 1);
    let entry: CacheEntry =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    let deps: Vec<&Path> = entry.dependencies.iter().map(|d| d.path.as_path()).collect();
    assert_eq!(deps, vec![file.as_path(), project.loader_js.as_path()]);
    assert_eq!(entry.context_dependencies[0].path, src_dir);
    assert_eq!(entry.context_dependencies[0].mtime, Mtime::from_millis(PAST));
    assert_eq!(entry.remaining_request, request(&file));
    assert_eq!(entry.result.0, "let f = 1\n");
}

#[test]
fn dependency_in_flux_is_not_cached() {
    let project = Project::new();
    let source = "let g = 1";
    let file = project.source("g.ts", source);
    let future = Mtime::from_millis(Mtime::now().as_millis() + 3_600_000);
    let hot = project.path("hot.ts");
    write_file(&hot, "export {}", future);
    let compiler = FakeCompiler::new();
    let loader = project.loader(&compiler, json!({ "cache": true }));

    let mut ctx = project.context(&file).with_dependency(&hot);
    let output = loader.load(&mut ctx, &request(&file), source).unwrap();
    loader.wait_for_writes();

    assert_eq!(output.content, "let g = 1\n");
    assert!(project.cache_files().is_empty());
}

#[test]
fn run_without_pitch_decision_does_not_cache() {
    let project = Project::new();
    let file = project.source("h.ts", "let h = 1");
    let compiler = FakeCompiler::new();
    let loader = project.loader(&compiler, json!({ "cache": true }));

    let mut ctx = project.context(&file);
    loader.run(&mut ctx, "let h = 1", &RequestData::new()).unwrap();
    loader.wait_for_writes();

    assert!(project.cache_files().is_empty());
}

#[test]
fn cache_disabled_always_compiles_and_never_persists() {
    let project = Project::new();
    let source = "let i: number = 1";
    let file = project.source("i.ts", source);
    let compiler = FakeCompiler::new();
    let counters = compiler.counters();
    let loader = project.loader(&compiler, json!({}));
    assert!(!loader.cache_enabled());

    for _ in 0..2 {
        let mut ctx = project.context(&file);
        let mut data = RequestData::new();
        assert_eq!(
            loader.pitch(&mut ctx, &request(&file), &mut data),
            PitchOutcome::Continue
        );
        assert_eq!(data, RequestData::default());
        let output = loader.run(&mut ctx, source, &data).unwrap();
        assert_eq!(output.content, "let i = 1\n");
        assert!(!loader
            .session()
            .unwrap()
            .lock()
            .registry()
            .is_emitted(&request(&file)));
    }
    loader.wait_for_writes();
    assert_eq!(counters.compiles(), 2);
    assert!(!project.path(DEFAULT_CACHE_DIRECTORY).exists());
}

#[test]
fn repeated_compiles_are_byte_identical() {
    let project = Project::new();
    let source = "function twice(n: number): number { return n * 2 }";
    let file = project.source("j.ts", source);
    let compiler = FakeCompiler::new();
    let loader = project.loader(&compiler, json!({ "cache": true }));

    let first = loader
        .load(&mut project.context(&file), &request(&file), source)
        .unwrap();
    loader.wait_for_writes();
    let second = loader
        .load(&mut project.context(&file), &request(&file), source)
        .unwrap();

    assert_eq!(first.content, second.content);
    assert_eq!(
        serde_json::to_string(&first.source_map).unwrap(),
        serde_json::to_string(&second.source_map).unwrap()
    );
}

/// Maps every request to one key, as a digest collision would.
struct CollidingStore(JsonFileStore);

impl CacheStore for CollidingStore {
    fn cache_key(&self, _request: &str) -> String {
        "collision".to_string()
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.0.read(key)
    }

    fn write(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        self.0.write(key, entry)
    }
}

#[test]
fn entry_for_another_request_is_never_served() {
    let project = Project::new();
    let a = project.source("a.ts", "let a = 1");
    let b = project.source("b.ts", "let b = 2");
    let compiler = FakeCompiler::new();
    let store = Arc::new(CollidingStore(JsonFileStore::new("id", project.path("custom"))));
    let loader = Loader::builder(Arc::new(compiler.clone()), LoaderOptions::default())
        .cwd(project.dir.path())
        .cache_store(store)
        .io_threads(2)
        .build()
        .unwrap();
    assert!(loader.cache_enabled());

    loader
        .load(&mut project.context(&a), &request(&a), "let a = 1")
        .unwrap();
    loader.wait_for_writes();
    assert!(project.path("custom").join("collision.json").is_file());

    let mut data = RequestData::new();
    assert_eq!(
        loader.pitch(&mut project.context(&b), &request(&b), &mut data),
        PitchOutcome::Continue
    );
    let output = loader.run(&mut project.context(&b), "let b = 2", &data).unwrap();
    assert_eq!(output.content, "let b = 2\n");
}

#[test]
fn missing_config_fails_every_invocation_with_the_same_error() {
    let project = Project::new();
    std::fs::remove_file(project.path("tsconfig.json")).unwrap();
    let file = project.source("k.ts", "let k = 1");
    let loader = project.loader(&FakeCompiler::new(), json!({}));

    let first = loader
        .run(&mut project.context(&file), "let k = 1", &RequestData::new())
        .unwrap_err();
    let second = loader
        .run(&mut project.context(&file), "let k = 1", &RequestData::new())
        .unwrap_err();

    assert!(first
        .to_string()
        .starts_with("(tscache-loader) tsconfig file "));
    match (first, second) {
        (LoaderError::Config(a), LoaderError::Config(b)) => assert!(Arc::ptr_eq(&a, &b)),
        other => panic!("expected config errors, got {other:?}"),
    }
    assert!(loader.session().is_none());
}

#[test]
fn conflicting_configs_are_rejected_up_front() {
    let options = LoaderOptions {
        tsconfig: Some("tsconfig.json".into()),
        jsconfig: Some("jsconfig.json".into()),
        ..LoaderOptions::default()
    };
    let result = Loader::builder(Arc::new(FakeCompiler::new()), options)
        .cwd("/")
        .build();
    assert!(result.is_err());
}

#[test]
fn lint_formatter_renders_every_diagnostic() {
    let project = Project::new();
    std::fs::write(project.path("tslint.json"), "{}").unwrap();
    let source = "console.log(1)";
    let file = project.source("l.ts", source);
    let loader = project.loader(
        &FakeCompiler::new(),
        json!({ "tslint": "tslint.json", "tslintFormatter": "prose" }),
    );

    let mut ctx = project.context(&file);
    loader.load(&mut ctx, &request(&file), source).unwrap();

    assert!(ctx.errors.is_empty());
    assert_eq!(
        ctx.warnings,
        vec![format!(
            "WARNING: {}:1:1 [no-console] Calls to 'console.log' are not allowed.",
            request(&file)
        )]
    );
}

#[test]
fn unknown_lint_formatter_keeps_the_default() {
    let project = Project::new();
    std::fs::write(project.path("tslint.json"), "{}").unwrap();
    let source = "console.log(1)";
    let file = project.source("m.ts", source);
    let loader = project.loader(
        &FakeCompiler::new(),
        json!({ "tslint": "tslint.json", "tslintFormatter": "nope" }),
    );

    let mut ctx = project.context(&file);
    loader.load(&mut ctx, &request(&file), source).unwrap();

    assert_eq!(
        ctx.warnings,
        vec!["(0,0): Calls to 'console.log' are not allowed.".to_string()]
    );
}

#[test]
fn missing_lint_config_is_a_config_error() {
    let project = Project::new();
    let file = project.source("n.ts", "let n = 1");
    let loader = project.loader(&FakeCompiler::new(), json!({ "tslint": "tslint.json" }));

    let err = loader
        .run(&mut project.context(&file), "let n = 1", &RequestData::new())
        .unwrap_err();
    assert!(err.to_string().contains("tslint file"));
}

#[test]
fn lint_without_a_linter_is_a_config_error() {
    let project = Project::new();
    std::fs::write(project.path("tslint.json"), "{}").unwrap();
    let file = project.source("o.ts", "let o = 1");
    let options = LoaderOptions::from_json(json!({ "tslint": "tslint.json" }), LOADER_NAME).unwrap();
    let loader = Loader::builder(Arc::new(FakeCompiler::new()), options)
        .cwd(project.dir.path())
        .build()
        .unwrap();

    let err = loader
        .run(&mut project.context(&file), "let o = 1", &RequestData::new())
        .unwrap_err();
    assert!(matches!(err, LoaderError::Config(_)));
}

#[test]
fn first_run_starts_watching_the_file() {
    let project = Project::new();
    let file = project.source("p.ts", "let p = 1");
    let loader = project.loader(&FakeCompiler::new(), json!({}));

    loader
        .run(&mut project.context(&file), "let p = 1", &RequestData::new())
        .unwrap();

    assert!(loader.watcher().unwrap().is_tracked(&request(&file)));
}

#[test]
fn failed_first_compile_still_watches_the_file() {
    let project = Project::new();
    let file = project.source("q.ts", "let q = 1");
    let compiler = FakeCompiler::new().with_malformed_transpile_map();
    let loader = project.loader(&compiler, json!({}));

    let err = loader
        .run(&mut project.context(&file), "let q = 1", &RequestData::new())
        .unwrap_err();
    assert!(matches!(err, LoaderError::Service(_)));
    assert!(loader.watcher().unwrap().is_tracked(&request(&file)));

    // The next request re-emits through the service.
    let output = loader
        .run(&mut project.context(&file), "let q = 1", &RequestData::new())
        .unwrap();
    assert_eq!(output.content, "let q = 1\n");
}
