//! Minify and downlevel a linked bundle with oxc.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{HelperLoaderMode, TransformOptions, Transformer};

use super::ScriptError;
use super::helpers;

/// Lower `code` to `target`, minifying first when asked.
///
/// Minification runs before lowering so the compressor cannot reintroduce
/// syntax newer than the target. Helpers the lowered code calls are
/// defined in a wrapper around it.
pub fn compile(code: &str, name: &Path, target: &str, minify: bool) -> Result<String, ScriptError> {
    let code = if minify { minify_js(code)? } else { code.to_owned() };
    let lowered = lower(&code, name, target, minify)?;
    let Some(prelude) = helpers::prelude(&lowered)? else {
        return Ok(lowered);
    };
    let wrapped = format!("(function () {{\n{prelude}{lowered}\n}})();\n");
    if minify { reprint(&wrapped) } else { Ok(wrapped) }
}

/// Print `code` compactly without compressing it.
fn reprint(code: &str) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(ScriptError::Transform(err.to_string()));
    }
    Ok(Codegen::new().with_options(codegen_options(true)).build(&ret.program).code)
}

fn minify_js(code: &str) -> Result<String, ScriptError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(ScriptError::Transform(err.to_string()));
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    Ok(Codegen::new()
        .with_options(codegen_options(true))
        .with_scoping(ret.scoping)
        .build(&program)
        .code)
}

fn lower(code: &str, name: &Path, target: &str, minify: bool) -> Result<String, ScriptError> {
    let mut options = TransformOptions::from_target(target).map_err(ScriptError::Transform)?;
    // `babelHelpers.*` calls, resolved by `helpers::prelude`.
    options.helper_loader.mode = HelperLoaderMode::External;

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if let Some(err) = ret.errors.first() {
        return Err(ScriptError::Transform(err.to_string()));
    }
    let mut program = ret.program;

    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let ret = Transformer::new(&allocator, name, &options).build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(ToString::to_string).collect();
        return Err(ScriptError::Transform(messages.join("; ")));
    }

    Ok(Codegen::new()
        .with_options(codegen_options(minify))
        .with_scoping(Some(ret.scoping))
        .build(&program)
        .code)
}

fn codegen_options(minify: bool) -> CodegenOptions {
    if minify {
        CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        }
    } else {
        CodegenOptions::default()
    }
}
