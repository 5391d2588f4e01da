//! `conanbuildinfo.cmake` generation for consumer projects.

use crate::cpp_info::CppInfo;
use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};

/// File name of the generated CMake include.
pub const BUILD_INFO_FILE: &str = "conanbuildinfo.cmake";

/// Render the CMake variables and `conan_basic_setup()` macro describing a
/// package rooted at `package_root`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use gtest_recipe::cpp_info::CppInfo;
/// use gtest_recipe::generator::render_build_info;
///
/// let info = CppInfo { libs: vec!["gtest".into()], ..CppInfo::default() };
/// let cmake = render_build_info(&info, Utf8Path::new("/pkg"));
/// assert!(cmake.contains("set(CONAN_LIBS gtest)"));
/// assert!(cmake.contains("macro(conan_basic_setup)"));
/// ```
#[must_use]
pub fn render_build_info(info: &CppInfo, package_root: &Utf8Path) -> String {
    let root = cmake_path(package_root.as_str());
    let dirs = |relative: &[String]| {
        relative
            .iter()
            .map(|dir| format!("\"{root}/{}\"", cmake_path(dir)))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let defines = info
        .defines
        .iter()
        .map(|define| format!("-D{define}"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = [
        format!("set(CONAN_GOOGLETEST_ROOT \"{root}\")"),
        format!("set(CONAN_INCLUDE_DIRS {})", dirs(&info.include_dirs)),
        format!("set(CONAN_LIB_DIRS {})", dirs(&info.lib_dirs)),
        format!("set(CONAN_BIN_DIRS {})", dirs(&info.bin_dirs)),
        format!("set(CONAN_LIBS {})", info.libs.join(" ")),
        format!("set(CONAN_DEFINES {defines})"),
    ]
    .join("\n");
    out.push('\n');
    out.push_str(concat!(
        "\n",
        "macro(conan_basic_setup)\n",
        "    include_directories(${CONAN_INCLUDE_DIRS})\n",
        "    link_directories(${CONAN_LIB_DIRS})\n",
        "    add_definitions(${CONAN_DEFINES})\n",
        "endmacro()\n",
    ));
    out
}

/// Write [`BUILD_INFO_FILE`] into `dest_folder`.
///
/// # Errors
///
/// Returns [`crate::error::RecipeError::Io`] if the file cannot be written.
pub fn write_build_info(
    info: &CppInfo,
    package_root: &Utf8Path,
    dest_folder: &Utf8Path,
) -> Result<Utf8PathBuf> {
    let path = dest_folder.join(BUILD_INFO_FILE);
    std::fs::create_dir_all(dest_folder)?;
    std::fs::write(&path, render_build_info(info, package_root))?;
    Ok(path)
}

/// CMake accepts forward slashes on every platform.
fn cmake_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_directories_libs_and_defines() {
        let info = CppInfo {
            libs: vec![
                "gtest".to_owned(),
                "gtest_main".to_owned(),
                "gmock".to_owned(),
            ],
            defines: vec!["GTEST_LINKED_AS_SHARED_LIBRARY=1".to_owned()],
            ..CppInfo::default()
        };

        let cmake = render_build_info(&info, Utf8Path::new("/work/package/x86_64-release"));

        assert!(cmake.contains("set(CONAN_INCLUDE_DIRS \"/work/package/x86_64-release/include\")"));
        assert!(cmake.contains("set(CONAN_LIBS gtest gtest_main gmock)"));
        assert!(cmake.contains("set(CONAN_DEFINES -DGTEST_LINKED_AS_SHARED_LIBRARY=1)"));
    }

    #[test]
    fn variables_precede_setup_macro() {
        let cmake = render_build_info(&CppInfo::default(), Utf8Path::new("/pkg"));
        let lines: Vec<&str> = cmake.lines().collect();

        assert_eq!(lines.first(), Some(&"set(CONAN_GOOGLETEST_ROOT \"/pkg\")"));
        assert_eq!(lines.get(5), Some(&"set(CONAN_DEFINES )"));
        assert_eq!(lines.get(6), Some(&""));
        assert_eq!(lines.get(7), Some(&"macro(conan_basic_setup)"));
    }

    #[test]
    fn windows_paths_use_forward_slashes() {
        let cmake = render_build_info(&CppInfo::default(), Utf8Path::new(r"C:\work\package"));
        assert!(cmake.contains("\"C:/work/package/lib\""));
    }
}
