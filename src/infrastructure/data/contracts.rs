// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface RecycleCharge {
        function batchRecycle(
            uint256[][] calldata recycle_array,
            uint256[] calldata charge_ids
        ) external;
    }

    #[sol(rpc)]
    interface CellFactory {
        function batchCreationBySingleGene(
            uint256[][] calldata gene,
            uint256 quantity
        ) external payable;
    }

    #[sol(rpc)]
    interface LifePriceOracle {
        function getLifePrice(uint256[] calldata cells_) external view returns (uint256[] memory cellsPrice);
    }

    #[sol(rpc)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Call3Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Call3Result[] memory returnData);
    }
}
