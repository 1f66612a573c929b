use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "file-index-cli")]
#[command(about = "为目录下的文件名和文件夹名建立索引，快速查找文件位置")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 索引文件路径（覆盖配置）
    #[arg(short, long, global = true)]
    pub index_file: Option<PathBuf>,

    /// 详细输出
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 完整扫描目录并重建索引
    Index {
        /// 要索引的目录
        path: PathBuf,
    },

    /// 增量重建：移除已删除的文件，追加新文件
    Reindex {
        /// 建立索引时使用的目录
        path: PathBuf,
    },

    /// 按名称搜索文件（前缀 `-f ` 只搜文件夹，`-s ` 搜名称）
    Search {
        /// 搜索关键字
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// 按扩展名搜索文件
    Ext {
        /// 扩展名，例如 pdf 或 .pdf
        extension: String,
    },

    /// 显示索引文件信息
    Info,

    /// 删除索引文件
    Delete {
        /// 不询问确认
        #[arg(short, long)]
        force: bool,
    },

    /// 启动交互式搜索界面
    Tui {
        /// F5/F6 建立索引时使用的目录（默认为当前目录）
        root: Option<PathBuf>,
    },
}
