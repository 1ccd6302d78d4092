#![allow(dead_code)]

use std::path::{Path, PathBuf};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A single-package TypeScript service for integration tests.
///
/// Structure:
///   src/db.ts                         -> standalone
///   src/user.service.ts               -> imports ./db
///   src/user.service.spec.ts          -> imports ./user.service
///   src/auth/login.ts                 -> imports ../db
///   src/auth/__tests__/session.test.ts -> no imports (folder convention)
///   src/routes/users.ts               -> declares GET /users/:id, POST /users
///   test/api/users.test.ts            -> requests GET /users/42
///   src/utils/format.ts               -> standalone, no tests
///
/// Properties:
///   - changing db.ts reaches user.service.spec.ts at depth 2
///   - changing login.ts reaches session.test.ts only by folder convention
///   - changing routes/users.ts reaches users.test.ts only by route match
pub struct TestProject {
    pub dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl TestProject {
    /// Create the fixture. Caller must keep the returned value alive
    /// (dropping `TempDir` deletes the files).
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        write(&root, "package.json", r#"{"name":"service","version":"1.0.0"}"#);
        write(&root, "src/db.ts", "export const db = { query() {} };\n");
        write(
            &root,
            "src/user.service.ts",
            "import { db } from './db';\nexport class UserService { find() { return db.query(); } }\n",
        );
        write(
            &root,
            "src/user.service.spec.ts",
            "import { UserService } from './user.service';\ndescribe('UserService', () => {});\n",
        );
        write(
            &root,
            "src/auth/login.ts",
            "import { db } from '../db';\nexport function login() { return db; }\n",
        );
        write(
            &root,
            "src/auth/__tests__/session.test.ts",
            "describe('session', () => {});\n",
        );
        write(
            &root,
            "src/routes/users.ts",
            concat!(
                "import { Router } from 'express';\n",
                "const router = Router();\n",
                "router.get('/users/:id', (req, res) => res.json({}));\n",
                "router.post('/users', (req, res) => res.json({}));\n",
                "export default router;\n",
            ),
        );
        write(
            &root,
            "test/api/users.test.ts",
            "import request from 'supertest';\nit('gets', () => request(app).get('/users/42'));\n",
        );
        write(&root, "src/utils/format.ts", "export const format = (s: string) => s;\n");

        Self { dir, root }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        write(&self.root, rel, content);
    }
}

/// An npm-workspaces monorepo.
///
/// Structure:
///   packages/ui      @app/ui     exports { ".", "./button", "./*" -> src }
///   packages/utils   @app/utils  no exports, src/index.ts
///   apps/web         @app/web    depends on @app/ui
///
/// Dependency chain: web -> ui -> utils, so a change in utils affects all
/// three packages.
pub struct MonorepoProject {
    pub dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl MonorepoProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        write(
            &root,
            "package.json",
            r#"{"name":"mono","private":true,"workspaces":["packages/*","apps/*"]}"#,
        );

        write(
            &root,
            "packages/utils/package.json",
            r#"{"name":"@app/utils","version":"1.0.0"}"#,
        );
        write(
            &root,
            "packages/utils/src/index.ts",
            "export const cx = (...c: string[]) => c.join(' ');\n",
        );

        write(
            &root,
            "packages/ui/package.json",
            r#"{
                "name": "@app/ui",
                "dependencies": {"@app/utils": "*"},
                "exports": {
                    ".": {"import": "./src/index.ts", "default": "./dist/index.js"},
                    "./button": "./src/button.tsx",
                    "./*": "./src/*.tsx"
                }
            }"#,
        );
        write(
            &root,
            "packages/ui/src/index.ts",
            "export { Button } from './button';\n",
        );
        write(
            &root,
            "packages/ui/src/button.tsx",
            "import { cx } from '@app/utils';\nexport const Button = () => cx('btn');\n",
        );
        write(
            &root,
            "packages/ui/src/card.tsx",
            "export const Card = () => null;\n",
        );

        write(
            &root,
            "apps/web/package.json",
            r#"{"name":"@app/web","dependencies":{"@app/ui":"workspace:*","react":"^18"}}"#,
        );
        write(
            &root,
            "apps/web/src/page.tsx",
            "import { Button } from '@app/ui';\nimport { Card } from '@app/ui/card';\nexport const Page = () => Button();\n",
        );
        write(
            &root,
            "apps/web/src/page.test.tsx",
            "import { Page } from './page';\ntest('renders', () => Page());\n",
        );

        Self { dir, root }
    }
}
