//! 全局符号解析：名字 → 核心分配的 id → `global_<id>` 导出
//!
//! 名字驻留归核心所有，宿主只负责把名字写进核心内存并询问 id。

use crate::error::LinkError;
use crate::loader::CoreExports;
use crate::registry::global_key;
use crate::state::HostState;
use crate::value::SchemeValue;
use wasmtime::{AsContextMut, Extern, Val};

/// 查询名字在核心中的 id；核心不认识该名字时返回 `None`
pub(crate) fn global_id(
    mut store: impl AsContextMut<Data = HostState>,
    core: &CoreExports,
    name: &str,
) -> wasmtime::Result<Option<i32>> {
    let bytes = name.as_bytes();
    let len = i32::try_from(bytes.len())?;
    let ptr = core.malloc.call(&mut store, len)?;
    core.memory
        .write(&mut store, ptr as u32 as usize, bytes)
        .map_err(|_| LinkError::OutOfBounds {
            ptr: ptr as u32,
            len: len as u32,
            memory_size: core.memory.data_size(&store),
        })?;
    // 访客异常挂起时不再调用 free，直接原样上抛
    let id = core.get_global_id.call(&mut store, (ptr, len))?;
    core.free.call(&mut store, ptr)?;
    Ok((id >= 0).then_some(id))
}

/// 在动态导出表中查找绑定；`None` 表示尚未链接，而不是永远不存在
pub(crate) fn lookup_global(
    mut store: impl AsContextMut<Data = HostState>,
    name: &str,
) -> wasmtime::Result<Option<Extern>> {
    let core = store.as_context_mut().data().core()?;
    let Some(id) = global_id(&mut store, &core, name)? else {
        return Ok(None);
    };
    Ok(store.as_context_mut().data().registry.get(&global_key(id)).cloned())
}

/// 读取保存闭包的全局变量
pub(crate) fn closure_value(
    store: impl AsContextMut<Data = HostState>,
    name: &str,
    item: &Extern,
) -> Result<SchemeValue, LinkError> {
    let unexpected = || LinkError::UnexpectedExportType {
        name: name.to_string(),
        expected: "global holding an i64 value",
    };
    match item {
        Extern::Global(global) => match global.get(store) {
            Val::I64(raw) => Ok(SchemeValue::from_raw(raw)),
            _ => Err(unexpected()),
        },
        _ => Err(unexpected()),
    }
}

/// 通过核心的通用闭包调用原语调用 `closure`
pub(crate) fn call_closure(
    mut store: impl AsContextMut<Data = HostState>,
    core: &CoreExports,
    closure: SchemeValue,
    args: &[SchemeValue],
) -> wasmtime::Result<SchemeValue> {
    let count = i32::try_from(args.len())?;
    let handle = core.new_args.call(&mut store, count)?;
    for (index, arg) in (0..count).zip(args) {
        core.set_args.call(&mut store, (handle, index, arg.raw()))?;
    }
    let raw = core.call_closure.call(&mut store, (closure.raw(), handle))?;
    Ok(SchemeValue::from_raw(raw))
}

/// 按名字解析并调用一个已链接的过程
pub(crate) fn call_named(
    mut store: impl AsContextMut<Data = HostState>,
    core: &CoreExports,
    name: &str,
    args: &[SchemeValue],
) -> wasmtime::Result<SchemeValue> {
    let item = lookup_global(&mut store, name)?.ok_or_else(|| {
        wasmtime::Error::new(crate::error::CoreError::GlobalNotFound {
            name: name.to_string(),
        })
    })?;
    let closure = closure_value(&mut store, name, &item)?;
    call_closure(store, core, closure, args)
}
