// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX Runtime 推理后端
//! 会话构建 (CPU/CUDA/TensorRT) + 单输入单输出推理

use std::path::PathBuf;

use anyhow::{Context, Result};
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{
        CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
        TensorRTExecutionProvider,
    },
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use tracing::info;

/// 推理设备
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
    Trt(i32),
}

impl OrtEP {
    /// 执行提供者列表, 按优先级回退到CPU
    fn providers(&self) -> Vec<ExecutionProviderDispatch> {
        match *self {
            OrtEP::CPU => vec![CPUExecutionProvider::default().build()],
            OrtEP::CUDA(device_id) => vec![
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CPUExecutionProvider::default().build(),
            ],
            OrtEP::Trt(device_id) => vec![
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CPUExecutionProvider::default().build(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub f: PathBuf,
    pub ep: OrtEP,
    /// (height, width)
    pub image_size: (u32, u32),
    pub output_name: String,
}

pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    height: u32,
    width: u32,
    output_name: String,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers(config.ep.providers())?
            .commit_from_file(&config.f)
            .with_context(|| format!("加载ONNX模型失败: {}", config.f.display()))?;

        info!(model = %config.f.display(), ep = ?config.ep, "✅ ONNX模型加载成功");

        let (height, width) = config.image_size;
        Ok(Self {
            session,
            ep: config.ep,
            height,
            width,
            output_name: config.output_name,
        })
    }

    /// NCHW 输入 → 原始输出张量
    pub fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        let input_tensor = Value::from_array(xs)?;
        let outputs = self.session.run(ort::inputs![input_tensor])?;

        let output_value = outputs
            .get(self.output_name.as_str())
            .with_context(|| format!("模型没有输出张量: {}", self.output_name))?;
        let (shape, data) = output_value.try_extract_tensor::<f32>()?;

        let shape_usize: Vec<usize> = shape.as_ref().iter().map(|&x| x as usize).collect();
        let ys = Array::from_shape_vec(IxDyn(&shape_usize), data.to_vec())?;
        Ok(ys)
    }

    pub fn ep(&self) -> OrtEP {
        self.ep
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}
