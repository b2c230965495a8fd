/// Language Table - Static Key → Vendor Id Mapping
///
/// **Responsibility:**
/// Map the language keys used by the UI (e.g. `python`, `cpp`) onto the
/// numeric ids understood by the remote sandbox.
///
/// **Rules:**
/// - The table is built once and never mutated
/// - Lookup is exact; an unknown key is an error and must never reach
///   the remote service
/// - Ids are the vendor's values as deployed (groovy and racket share 88,
///   commonlisp and scheme share 55)

use crate::error::UnsupportedLanguage;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Cpp,
    C,
    TypeScript,
    Ruby,
    Go,
    Rust,
    Php,
    Swift,
    CSharp,
    R,
    Perl,
    Scala,
    Haskell,
    Lua,
    Bash,
    Sql,
    Assembly,
    Clojure,
    Cobol,
    CommonLisp,
    D,
    Elixir,
    Erlang,
    FSharp,
    Fortran,
    Groovy,
    ObjectiveC,
    OCaml,
    Octave,
    Pascal,
    Prolog,
    Racket,
    Scheme,
    VisualBasic,
}

impl Language {
    /// Every supported language, in the order the language picker lists them
    pub const ALL: [Language; 37] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::CSharp,
        Language::Go,
        Language::Rust,
        Language::Swift,
        Language::Ruby,
        Language::Php,
        Language::Haskell,
        Language::Scala,
        Language::Elixir,
        Language::Erlang,
        Language::FSharp,
        Language::Clojure,
        Language::OCaml,
        Language::CommonLisp,
        Language::Scheme,
        Language::Racket,
        Language::Assembly,
        Language::D,
        Language::Fortran,
        Language::Bash,
        Language::Perl,
        Language::Lua,
        Language::R,
        Language::Cobol,
        Language::Pascal,
        Language::VisualBasic,
        Language::Groovy,
        Language::Sql,
        Language::Prolog,
        Language::ObjectiveC,
        Language::Octave,
    ];

    /// Key used on the wire and in the UI
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::TypeScript => "typescript",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Swift => "swift",
            Language::CSharp => "csharp",
            Language::R => "r",
            Language::Perl => "perl",
            Language::Scala => "scala",
            Language::Haskell => "haskell",
            Language::Lua => "lua",
            Language::Bash => "bash",
            Language::Sql => "sql",
            Language::Assembly => "assembly",
            Language::Clojure => "clojure",
            Language::Cobol => "cobol",
            Language::CommonLisp => "commonlisp",
            Language::D => "d",
            Language::Elixir => "elixir",
            Language::Erlang => "erlang",
            Language::FSharp => "fsharp",
            Language::Fortran => "fortran",
            Language::Groovy => "groovy",
            Language::ObjectiveC => "objectivec",
            Language::OCaml => "ocaml",
            Language::Octave => "octave",
            Language::Pascal => "pascal",
            Language::Prolog => "prolog",
            Language::Racket => "racket",
            Language::Scheme => "scheme",
            Language::VisualBasic => "visualbasic",
        }
    }

    /// Human-readable name for pickers and CLI listings
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::C => "C",
            Language::TypeScript => "TypeScript",
            Language::Ruby => "Ruby",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Php => "PHP",
            Language::Swift => "Swift",
            Language::CSharp => "C#",
            Language::R => "R",
            Language::Perl => "Perl",
            Language::Scala => "Scala",
            Language::Haskell => "Haskell",
            Language::Lua => "Lua",
            Language::Bash => "Bash",
            Language::Sql => "SQL",
            Language::Assembly => "Assembly",
            Language::Clojure => "Clojure",
            Language::Cobol => "COBOL",
            Language::CommonLisp => "Common Lisp",
            Language::D => "D",
            Language::Elixir => "Elixir",
            Language::Erlang => "Erlang",
            Language::FSharp => "F#",
            Language::Fortran => "Fortran",
            Language::Groovy => "Groovy",
            Language::ObjectiveC => "Objective-C",
            Language::OCaml => "OCaml",
            Language::Octave => "Octave",
            Language::Pascal => "Pascal",
            Language::Prolog => "Prolog",
            Language::Racket => "Racket",
            Language::Scheme => "Scheme",
            Language::VisualBasic => "Visual Basic",
        }
    }

    /// Numeric id understood by the remote sandbox
    pub fn judge0_id(&self) -> u32 {
        match self {
            Language::Python => 71,
            Language::JavaScript => 63,
            Language::Java => 62,
            Language::Cpp => 54,
            Language::C => 50,
            Language::TypeScript => 74,
            Language::Ruby => 72,
            Language::Go => 60,
            Language::Rust => 73,
            Language::Php => 68,
            Language::Swift => 83,
            Language::CSharp => 51,
            Language::R => 80,
            Language::Perl => 85,
            Language::Scala => 81,
            Language::Haskell => 61,
            Language::Lua => 64,
            Language::Bash => 46,
            Language::Sql => 82,
            Language::Assembly => 45,
            Language::Clojure => 86,
            Language::Cobol => 77,
            Language::CommonLisp => 55,
            Language::D => 56,
            Language::Elixir => 57,
            Language::Erlang => 58,
            Language::FSharp => 87,
            Language::Fortran => 59,
            Language::Groovy => 88,
            Language::ObjectiveC => 79,
            Language::OCaml => 65,
            Language::Octave => 66,
            Language::Pascal => 67,
            Language::Prolog => 69,
            Language::Racket => 88,
            Language::Scheme => 55,
            Language::VisualBasic => 84,
        }
    }

    /// Snippet loaded into the editor when switching to this language
    pub fn starter_code(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("# Welcome to the playground\nprint(\"Hello, World!\")"),
            Language::JavaScript => {
                Some("// Welcome to the playground\nconsole.log(\"Hello, World!\");")
            }
            Language::Java => Some(
                "// Welcome to the playground\npublic class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}",
            ),
            Language::Cpp => Some(
                "// Welcome to the playground\n#include <iostream>\nusing namespace std;\n\nint main() {\n    cout << \"Hello, World!\" << endl;\n    return 0;\n}",
            ),
            Language::C => Some(
                "// Welcome to the playground\n#include <stdio.h>\n\nint main() {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}",
            ),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageTable::global().resolve(s)
    }
}

lazy_static! {
    static ref GLOBAL_TABLE: LanguageTable = LanguageTable::build();
}

/// Immutable registry of supported languages keyed by their wire key
#[derive(Debug)]
pub struct LanguageTable {
    by_key: HashMap<&'static str, Language>,
}

impl LanguageTable {
    fn build() -> Self {
        let by_key = Language::ALL
            .iter()
            .map(|language| (language.as_str(), *language))
            .collect();
        Self { by_key }
    }

    /// Process-wide table, constructed on first use
    pub fn global() -> &'static LanguageTable {
        &GLOBAL_TABLE
    }

    /// Resolve a key, failing for anything the sandbox does not know about
    pub fn resolve(&self, key: &str) -> Result<Language, UnsupportedLanguage> {
        self.by_key
            .get(key)
            .copied()
            .ok_or_else(|| UnsupportedLanguage(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Languages in picker order
    pub fn languages(&self) -> &'static [Language] {
        &Language::ALL
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
