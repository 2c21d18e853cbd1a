//! Language registry
//!
//! Static mapping between the language ids used by editors and the runtime ids
//! understood by the execution provider. Lookups never fail: anything unknown
//! resolves to [`DEFAULT_LANGUAGE`].

use judge_client::RuntimeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    TypeScript,
    Go,
    Cpp,
    Rust,
    Java,
    C,
}

pub const DEFAULT_LANGUAGE: Language = Language::JavaScript;

impl Language {
    pub const ALL: [Language; 8] = [
        Language::JavaScript,
        Language::Python,
        Language::TypeScript,
        Language::Go,
        Language::Cpp,
        Language::Rust,
        Language::Java,
        Language::C,
    ];

    /// Canonical language id
    pub fn id(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Cpp => "cpp",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::C => "c",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::TypeScript => "TypeScript",
            Language::Go => "Go",
            Language::Cpp => "C++",
            Language::Rust => "Rust",
            Language::Java => "Java",
            Language::C => "C",
        }
    }

    pub fn runtime_id(&self) -> RuntimeId {
        let id = match self {
            Language::JavaScript => 63,
            Language::Python => 71,
            Language::TypeScript => 74,
            Language::Go => 95,
            Language::Cpp => 54,
            Language::Rust => 73,
            Language::Java => 62,
            Language::C => 50,
        };
        RuntimeId(id)
    }

    pub fn from_runtime_id(runtime_id: RuntimeId) -> Option<Language> {
        Language::ALL
            .into_iter()
            .find(|language| language.runtime_id() == runtime_id)
    }

    /// Starter program shown when a document switches to this language
    pub fn template(&self) -> &'static str {
        match self {
            Language::JavaScript => r#"console.log("Hello, World!");"#,
            Language::Python => r#"print("Hello, World!")"#,
            Language::TypeScript => r#"console.log("Hello, World!");"#,
            Language::Go => concat!(
                "package main\n",
                "import \"fmt\"\n",
                "\n",
                "func main() {\n",
                "    fmt.Println(\"Hello, World!\")\n",
                "}"
            ),
            Language::Cpp => concat!(
                "#include <iostream>\n",
                "\n",
                "int main() {\n",
                "    std::cout << \"Hello, World!\" << std::endl;\n",
                "    return 0;\n",
                "}"
            ),
            Language::Rust => concat!(
                "fn main() {\n",
                "    println!(\"Hello, World!\");\n",
                "}"
            ),
            Language::Java => concat!(
                "public class HelloWorld {\n",
                "    public static void main(String[] args) {\n",
                "        System.out.println(\"Hello, World!\");\n",
                "    }\n",
                "}"
            ),
            Language::C => concat!(
                "#include <stdio.h>\n",
                "\n",
                "int main() {\n",
                "    printf(\"Hello, World!\\n\");\n",
                "    return 0;\n",
                "}"
            ),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::JavaScript),
            "python" | "py" => Ok(Language::Python),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "go" => Ok(Language::Go),
            "cpp" => Ok(Language::Cpp),
            "rust" => Ok(Language::Rust),
            "java" => Ok(Language::Java),
            "c" => Ok(Language::C),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Resolve a language id to the provider runtime, falling back to the default
pub fn to_runtime_id(language_id: &str) -> RuntimeId {
    language_id
        .parse::<Language>()
        .unwrap_or(DEFAULT_LANGUAGE)
        .runtime_id()
}

/// Inverse of [`to_runtime_id`], with the same fallback
pub fn to_language_id(runtime_id: RuntimeId) -> &'static str {
    Language::from_runtime_id(runtime_id)
        .unwrap_or(DEFAULT_LANGUAGE)
        .id()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub language: &'static str,
    pub label: &'static str,
    pub runtime_id: RuntimeId,
    pub template: &'static str,
}

pub fn supported_languages() -> Vec<LanguageInfo> {
    Language::ALL
        .into_iter()
        .map(|language| LanguageInfo {
            language: language.id(),
            label: language.label(),
            runtime_id: language.runtime_id(),
            template: language.template(),
        })
        .collect()
}
