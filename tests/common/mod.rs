//! On-disk fixture project shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

const FILES: &[(&str, &str)] = &[
    (
        ".eleventy.js",
        "module.exports = function (config) {\n  return require(\"./test/stubs/config-deps.js\");\n};\n",
    ),
    (
        "test/stubs/config-deps.js",
        "const upstream = require(\"./config-deps-upstream\");\nmodule.exports = function () {\n  return upstream;\n};\n",
    ),
    ("test/stubs/config-deps-upstream.js", "module.exports = {};\n"),
    (
        "test/stubs/dependencies/two-deps.11ty.js",
        "const dep1 = require(\"./dep1\");\nconst dep2 = require(\"./dep2\");\n\nmodule.exports = function () {\n  return dep1 + dep2;\n};\n",
    ),
    ("test/stubs/dependencies/dep1.js", "module.exports = 1;\n"),
    ("test/stubs/dependencies/dep2.js", "module.exports = 2;\n"),
    ("test/stubs/dependencies/dep3.js", "module.exports = 3;\n"),
    (
        "test/stubs/uses-library.js",
        "const fs = require(\"fs\");\nconst lodash = require(\"lodash\");\nconst helper = require(\"./local-helper\");\n",
    ),
    (
        "test/stubs/local-helper.js",
        "const merge = require(\"lodash/merge\");\nconst data = require(\"./data.json\");\nmodule.exports = { merge, data };\n",
    ),
    ("test/stubs/data.json", "{ \"title\": \"site\" }\n"),
    (
        "node_modules/lodash/package.json",
        "{ \"name\": \"lodash\", \"main\": \"index.js\" }\n",
    ),
    (
        "node_modules/lodash/index.js",
        "module.exports = require(\"./merge\");\n",
    ),
    ("node_modules/lodash/merge.js", "module.exports = function () {};\n"),
    (
        "test/stubs/esm/entry.mjs",
        "import a from \"./a.mjs\";\nexport default a;\n",
    ),
    ("test/stubs/esm/a.mjs", "export { b as default } from \"./b.mjs\";\n"),
    ("test/stubs/esm/b.mjs", "export const b = await import(\"./c.mjs\");\n"),
    ("test/stubs/esm/c.mjs", "export const c = 3;\n"),
    (
        "test/stubs/ts/entry.ts",
        "import { helper } from \"./util\";\nexport * from \"./types\";\nexport const run = () => helper();\n",
    ),
    ("test/stubs/ts/util.ts", "export const helper = (): number => 1;\n"),
    ("test/stubs/ts/types.ts", "export interface Site { title: string }\n"),
    (
        "test/stubs/broken.js",
        "const missing = require(\"./does-not-exist\");\n",
    ),
    (
        "test/stubs/cycle-a.js",
        "module.exports = require(\"./cycle-b\");\n",
    ),
    (
        "test/stubs/cycle-b.js",
        "module.exports = require(\"./cycle-a\");\n",
    ),
    ("test/b.js", "module.exports = {};\n"),
];

/// Create the fixture project in a fresh temp dir.
pub fn fixture_project() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (rel, contents) in FILES {
        write(dir.path(), rel, contents);
    }
    dir
}

pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(&path, contents).expect("write fixture file");
}
