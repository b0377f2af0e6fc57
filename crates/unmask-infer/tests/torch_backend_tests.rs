use std::fs;
use std::path::PathBuf;

use candle_core::DType;
use candle_nn::{VarBuilder, VarMap};
use unmask_base::Tensor;
use unmask_infer::meso4::Meso4;
use unmask_infer::{backend_for, BackendKind, Device, HeadWidth, InferError, ModelSource};

fn temp_model(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("unmask-torch-test-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir.join(name)
}

/// Save a fresh (zero-initialized) Meso4 checkpoint, optionally wrapping
/// every tensor name in a prefix the way distributed training exports do.
fn save_checkpoint(path: &PathBuf, head_units: usize, prefix: Option<&str>) {
    let varmap = VarMap::new();
    let device = candle_core::Device::Cpu;
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let vb = match prefix {
        Some(prefix) => vb.pp(prefix),
        None => vb,
    };
    Meso4::load(vb, (64, 64), head_units).expect("build model");
    // from_varmap seeds fresh layers randomly; zero them so fixtures are
    // deterministic.
    for var in varmap.all_vars() {
        var.set(&var.zeros_like().expect("zeros")).expect("zero var");
    }
    varmap.save(path).expect("save checkpoint");
}

#[test]
fn test_torch_load_two_class_head() {
    let path = temp_model("two_class.safetensors");
    save_checkpoint(&path, 2, None);

    let backend = backend_for(BackendKind::Torch, Device::Cpu);
    let mut loaded = backend
        .load(ModelSource::File(path.clone()), (64, 64))
        .expect("load checkpoint");
    assert_eq!(loaded.head, HeadWidth::Two);

    let batch = Tensor::zeros(vec![2, 3, 64, 64]).unwrap();
    let output = loaded.session.run(&batch).expect("run");
    assert_eq!(output.shape, vec![2, 2]);
    fs::remove_file(&path).ok();
}

#[test]
fn test_torch_load_single_unit_head() {
    let path = temp_model("single_unit.safetensors");
    save_checkpoint(&path, 1, None);

    let backend = backend_for(BackendKind::Torch, Device::Cpu);
    let mut loaded = backend
        .load(ModelSource::File(path.clone()), (64, 64))
        .expect("load checkpoint");
    assert_eq!(loaded.head, HeadWidth::One);

    let batch = Tensor::zeros(vec![1, 3, 64, 64]).unwrap();
    let output = loaded.session.run(&batch).expect("run");
    assert_eq!(output.shape, vec![1, 1]);
    fs::remove_file(&path).ok();
}

#[test]
fn test_torch_load_prefixed_checkpoint() {
    let path = temp_model("prefixed.safetensors");
    save_checkpoint(&path, 2, Some("module"));

    let backend = backend_for(BackendKind::Torch, Device::Cpu);
    let loaded = backend
        .load(ModelSource::File(path.clone()), (64, 64))
        .expect("load prefixed checkpoint");
    assert_eq!(loaded.head, HeadWidth::Two);
    fs::remove_file(&path).ok();
}

#[test]
fn test_torch_load_from_memory() {
    let path = temp_model("memory.safetensors");
    save_checkpoint(&path, 2, None);
    let bytes = fs::read(&path).expect("read checkpoint");
    fs::remove_file(&path).ok();

    let backend = backend_for(BackendKind::Torch, Device::Cpu);
    let mut loaded = backend
        .load(ModelSource::Memory(bytes), (64, 64))
        .expect("load from memory");
    assert_eq!(loaded.head, HeadWidth::Two);

    let batch = Tensor::zeros(vec![1, 3, 64, 64]).unwrap();
    let output = loaded.session.run(&batch).expect("run");
    assert_eq!(output.shape, vec![1, 2]);
}

#[test]
fn test_torch_rejects_unsupported_head_width() {
    let path = temp_model("wide_head.safetensors");
    save_checkpoint(&path, 3, None);

    let backend = backend_for(BackendKind::Torch, Device::Cpu);
    let result = backend.load(ModelSource::File(path.clone()), (64, 64));
    assert!(matches!(result, Err(InferError::ModelLoad(_))));
    fs::remove_file(&path).ok();
}

#[test]
fn test_torch_rejects_missing_file() {
    let backend = backend_for(BackendKind::Torch, Device::Cpu);
    let result = backend.load(
        ModelSource::File(PathBuf::from("/nonexistent/model.safetensors")),
        (64, 64),
    );
    assert!(matches!(result, Err(InferError::Io(_))));
}

#[test]
fn test_torch_rejects_garbage_bytes() {
    let backend = backend_for(BackendKind::Torch, Device::Cpu);
    let result = backend.load(ModelSource::Memory(vec![0u8; 64]), (64, 64));
    assert!(matches!(result, Err(InferError::ModelLoad(_))));
}
