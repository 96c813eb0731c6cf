// File tree builder - Rebuilds a folder hierarchy from flat relative paths
use crate::models::{FileNode, UploadedFile};
use std::path::Path;
use tracing::debug;

/// Language used when an extension is not in the table
pub const FALLBACK_LANGUAGE: &str = "javascript";

const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("java", "java"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("cxx", "cpp"),
    ("hpp", "cpp"),
    ("h", "cpp"),
    ("cs", "csharp"),
    ("go", "go"),
    ("rb", "ruby"),
    ("php", "php"),
    ("rs", "rust"),
    ("html", "html"),
    ("css", "css"),
    ("json", "json"),
    ("md", "markdown"),
];

/// Infer the language tag of a file from its extension
pub fn language_for_path(path: &str) -> &'static str {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .and_then(|ext| {
            EXTENSION_LANGUAGES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, lang)| *lang)
        })
        .unwrap_or(FALLBACK_LANGUAGE)
}

/// Map an extension-table tag to the name shown in the language selector
pub fn display_language(tag: &str) -> &str {
    match tag {
        "python" => "Python",
        "javascript" => "JavaScript",
        "typescript" => "TypeScript",
        "java" => "Java",
        "cpp" => "C++",
        "csharp" => "C#",
        "go" => "Go",
        "ruby" => "Ruby",
        "php" => "PHP",
        other => other,
    }
}

/// Folds uploaded files into a forest, one file at a time
#[derive(Debug, Default)]
pub struct FileTreeBuilder {
    roots: Vec<FileNode>,
}

impl FileTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one file. Directories are matched by name among the directories of
    /// each level and created on first sight; a repeated file path replaces the old leaf.
    pub fn insert(&mut self, file: UploadedFile) {
        let segments: Vec<&str> = file
            .relative_path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let Some((file_name, dirs)) = segments.split_last() else {
            debug!("Skipping upload with empty path");
            return;
        };

        let mut level = &mut self.roots;
        let mut prefix = String::new();
        for dir in dirs {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(dir);

            let index = match level
                .iter()
                .position(|n| n.is_dir() && n.name() == *dir)
            {
                Some(index) => index,
                None => {
                    level.push(FileNode::Directory {
                        name: dir.to_string(),
                        path: prefix.clone(),
                        children: Vec::new(),
                    });
                    level.len() - 1
                }
            };
            level = match &mut level[index] {
                FileNode::Directory { children, .. } => children,
                FileNode::File { .. } => unreachable!("position() only matches directories"),
            };
        }

        let path = if prefix.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", prefix, file_name)
        };
        let leaf = FileNode::File {
            name: file_name.to_string(),
            language: language_for_path(file_name).to_string(),
            path,
            content: file.content,
        };

        match level
            .iter_mut()
            .find(|n| !n.is_dir() && n.name() == *file_name)
        {
            Some(existing) => *existing = leaf,
            None => level.push(leaf),
        }
    }

    pub fn build(self) -> Vec<FileNode> {
        self.roots
    }
}

/// Build the explorer forest from already-read files, in input order
pub fn build_file_tree<I>(files: I) -> Vec<FileNode>
where
    I: IntoIterator<Item = UploadedFile>,
{
    files
        .into_iter()
        .fold(FileTreeBuilder::new(), |mut builder, file| {
            builder.insert(file);
            builder
        })
        .build()
}

/// Find a node by its full path
#[cfg(test)]
pub fn find_node<'a>(roots: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
    for node in roots {
        if node.path() == path {
            return Some(node);
        }
        if node.is_dir() && path.starts_with(&format!("{}/", node.path())) {
            if let Some(found) = find_node(node.children(), path) {
                return Some(found);
            }
        }
    }
    None
}

/// Depth-first listing with depths, for explorer rendering
pub fn flatten(roots: &[FileNode]) -> Vec<(usize, &FileNode)> {
    fn walk<'a>(nodes: &'a [FileNode], depth: usize, out: &mut Vec<(usize, &'a FileNode)>) {
        for node in nodes {
            out.push((depth, node));
            walk(node.children(), depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(roots, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> UploadedFile {
        UploadedFile::new(path, format!("// {}", path))
    }

    #[test]
    fn test_shared_prefix_shares_directories() {
        let tree = build_file_tree(vec![file("a/b/x.js"), file("a/b/y.py")]);

        assert_eq!(tree.len(), 1);
        let a = &tree[0];
        assert_eq!(a.name(), "a");
        assert_eq!(a.children().len(), 1);
        let b = &a.children()[0];
        assert_eq!(b.path(), "a/b");
        assert_eq!(b.children().len(), 2);

        match &b.children()[0] {
            FileNode::File { name, path, language, .. } => {
                assert_eq!(name, "x.js");
                assert_eq!(path, "a/b/x.js");
                assert_eq!(language, "javascript");
            }
            other => panic!("expected file, got {:?}", other),
        }
        match &b.children()[1] {
            FileNode::File { language, .. } => assert_eq!(language, "python"),
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn test_language_table() {
        assert_eq!(language_for_path("z.qq"), FALLBACK_LANGUAGE);
        assert_eq!(language_for_path("z.qq"), "javascript");
        assert_eq!(language_for_path("Makefile"), "javascript");
        assert_eq!(language_for_path("src/App.TSX"), "typescript");
        assert_eq!(language_for_path("main.go"), "go");
        assert_eq!(display_language("cpp"), "C++");
        assert_eq!(display_language("rust"), "rust");
    }

    #[test]
    fn test_forest_keeps_insertion_order() {
        let tree = build_file_tree(vec![file("web/index.js"), file("README.md"), file("api/app.py")]);
        let names: Vec<_> = tree.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["web", "README.md", "api"]);
    }

    #[test]
    fn test_no_file_is_lost() {
        let paths = [
            "proj/src/a.js",
            "proj/src/util/b.ts",
            "proj/test/c.py",
            "proj/src/util/d.rb",
            "proj/e.md",
        ];
        let tree = build_file_tree(paths.iter().map(|p| file(p)));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].file_count(), paths.len());
        for path in paths {
            assert!(find_node(&tree, path).is_some(), "missing {}", path);
        }
    }

    #[test]
    fn test_repeated_path_replaces_leaf() {
        let tree = build_file_tree(vec![
            UploadedFile::new("p/a.js", "old"),
            UploadedFile::new("p/a.js", "new"),
        ]);
        assert_eq!(tree[0].file_count(), 1);
        match find_node(&tree, "p/a.js") {
            Some(FileNode::File { content, .. }) => assert_eq!(content, "new"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_order_independent_contents() {
        let forward = build_file_tree(vec![file("r/a/1.js"), file("r/b/2.js")]);
        let reverse = build_file_tree(vec![file("r/b/2.js"), file("r/a/1.js")]);
        for path in ["r/a/1.js", "r/b/2.js"] {
            assert_eq!(find_node(&forward, path), find_node(&reverse, path));
        }
    }

    #[test]
    fn test_flatten_depths() {
        let tree = build_file_tree(vec![file("a/b/x.js"), file("a/y.py")]);
        let rows: Vec<_> = flatten(&tree)
            .into_iter()
            .map(|(depth, node)| (depth, node.path().to_string()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, "a".to_string()),
                (1, "a/b".to_string()),
                (2, "a/b/x.js".to_string()),
                (1, "a/y.py".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_path_is_ignored() {
        let tree = build_file_tree(vec![UploadedFile::new("", "x"), UploadedFile::new("//", "y")]);
        assert!(tree.is_empty());
    }
}
